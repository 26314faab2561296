use super::*;
use crate::config::EmbeddingsConfig;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(endpoint: String) -> EmbeddingsConfig {
    EmbeddingsConfig {
        endpoint,
        model: "test-model".to_string(),
        dimension: 3,
        api_key: "test-key".to_string(),
    }
}

#[test]
fn client_configuration() {
    let config = test_config("https://example.com".to_string());
    let client = EmbeddingClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.dimension, 3);
    assert_eq!(client.endpoint.host_str(), Some("example.com"));
    assert_eq!(client.retry_attempts, net::DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = test_config("https://example.com".to_string());
    let client = EmbeddingClient::new(&config)
        .expect("Failed to create client")
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn invalid_endpoint_is_rejected() {
    let config = test_config("not a url".to_string());
    assert!(EmbeddingClient::new(&config).is_err());
}

#[tokio::test]
async fn empty_batch_skips_the_api() {
    // Unroutable endpoint: any request would fail immediately.
    let config = test_config("http://127.0.0.1:9".to_string());
    let client = EmbeddingClient::new(&config).expect("Failed to create client");

    let embeddings = client
        .embed_batch(&[])
        .await
        .expect("empty batch should succeed without a request");
    assert!(embeddings.is_empty());
}

#[tokio::test]
async fn batch_request_normalizes_newlines_and_preserves_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "input": ["line one line two", "second text"],
            "model": "test-model",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]},
                {"object": "embedding", "index": 1, "embedding": [0.4, 0.5, 0.6]},
            ],
            "model": "test-model",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(server.uri());
    let client = EmbeddingClient::new(&config).expect("Failed to create client");

    let texts = vec!["line one\nline two".to_string(), "second text".to_string()];
    let embeddings = client
        .embed_batch(&texts)
        .await
        .expect("batch should succeed");

    assert_eq!(embeddings, vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
}

#[tokio::test]
async fn count_mismatch_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3]}],
        })))
        .mount(&server)
        .await;

    let config = test_config(server.uri());
    let client = EmbeddingClient::new(&config).expect("Failed to create client");

    let texts = vec!["one".to_string(), "two".to_string()];
    let error = client
        .embed_batch(&texts)
        .await
        .expect_err("count mismatch should fail");
    assert!(
        error
            .to_string()
            .contains("Mismatch between request and response counts")
    );
}

#[tokio::test]
async fn dimension_mismatch_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2]}],
        })))
        .mount(&server)
        .await;

    let config = test_config(server.uri());
    let client = EmbeddingClient::new(&config).expect("Failed to create client");

    let error = client
        .embed_query("question")
        .await
        .expect_err("dimension mismatch should fail");
    assert!(error.to_string().contains("dimensions"));
}

#[tokio::test]
async fn query_embedding_returns_single_vector() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [1.0, 0.0, 0.5]}],
        })))
        .mount(&server)
        .await;

    let config = test_config(server.uri());
    let client = EmbeddingClient::new(&config).expect("Failed to create client");

    let embedding = client
        .embed_query("question")
        .await
        .expect("query should succeed");
    assert_eq!(embedding, vec![1.0, 0.0, 0.5]);
}
