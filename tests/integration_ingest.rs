#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

use anyhow::Result;
use contextly::config::Config;
use contextly::embeddings::chunking::ChunkingConfig;
use contextly::ingest::{Ingestor, SourceIngestOutcome};
use contextly::sources::SourceInput;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const TEST_DIMENSION: usize = 8;

/// Responds to embedding requests with one vector per input text.
struct EmbeddingResponder;

impl Respond for EmbeddingResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("request body is JSON");
        let count = body["input"].as_array().map_or(0, Vec::len);
        let data: Vec<Value> = (0..count)
            .map(|i| json!({"index": i, "embedding": vec![0.1_f32; TEST_DIMENSION]}))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({"data": data}))
    }
}

/// Acknowledges upserts with the count of vectors received.
struct UpsertResponder;

impl Respond for UpsertResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("request body is JSON");
        let count = body["vectors"].as_array().map_or(0, Vec::len);
        ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": count}))
    }
}

async fn start_embedding_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(EmbeddingResponder)
        .mount(&server)
        .await;
    server
}

async fn start_vector_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(UpsertResponder)
        .mount(&server)
        .await;
    server
}

fn test_config(embedding_uri: &str, vector_uri: &str) -> Config {
    let mut config = Config::default();
    config.embeddings.endpoint = embedding_uri.to_string();
    config.embeddings.api_key = "test-key".to_string();
    config.embeddings.dimension = TEST_DIMENSION as u32;
    config.vector_store.endpoint = vector_uri.to_string();
    config.vector_store.api_key = "test-key".to_string();
    config
}

async fn upsert_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("requests should be recorded")
        .iter()
        .filter(|request| request.url.path() == "/vectors/upsert")
        .map(|request| serde_json::from_slice(&request.body).expect("request body is JSON"))
        .collect()
}

fn vector_ids(body: &Value) -> Vec<String> {
    body["vectors"]
        .as_array()
        .expect("vectors array")
        .iter()
        .map(|vector| vector["id"].as_str().expect("id is a string").to_string())
        .collect()
}

#[tokio::test]
async fn raw_text_yields_one_record_in_the_chatbot_namespace() -> Result<()> {
    let embedding_server = start_embedding_server().await;
    let vector_server = start_vector_server().await;
    let config = test_config(&embedding_server.uri(), &vector_server.uri());

    let ingestor = Ingestor::new(&config)?;
    let input = SourceInput {
        raw_text: Some("A. B. C.".to_string()),
        ..SourceInput::default()
    };

    let report = ingestor.ingest("acme", "bot1", &input).await?;

    assert_eq!(report.indexed_count(), 1);
    assert_eq!(
        report.sources[0].outcome,
        SourceIngestOutcome::Indexed {
            chunks: 1,
            vectors_upserted: 1,
        }
    );

    let bodies = upsert_bodies(&vector_server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["namespace"], "bot1");

    let vectors = bodies[0]["vectors"].as_array().expect("vectors array");
    assert_eq!(vectors.len(), 1);
    assert_eq!(vectors[0]["id"], "0_0");
    assert_eq!(vectors[0]["metadata"]["pageContent"], "A. B. C.");
    assert_eq!(vectors[0]["metadata"]["txtPath"], "0");
    assert_eq!(vectors[0]["metadata"]["clientName"], "acme");
    assert_eq!(vectors[0]["metadata"]["text"], "A. B. C.");
    assert_eq!(
        vectors[0]["values"].as_array().expect("values array").len(),
        TEST_DIMENSION
    );

    Ok(())
}

#[tokio::test]
async fn batches_never_exceed_the_configured_size() -> Result<()> {
    let embedding_server = start_embedding_server().await;
    let vector_server = start_vector_server().await;

    let mut config = test_config(&embedding_server.uri(), &vector_server.uri());
    config.chunking = ChunkingConfig {
        target_chunk_size: 50,
        overlap_size: 0,
    };
    config.ingest.upsert_batch_size = 10;

    // 1250 single-word tokens split into 25 chunks of 50 tokens each
    let words: Vec<String> = (0..1250).map(|i| format!("w{i}")).collect();
    let input = SourceInput {
        raw_text: Some(words.join(" ")),
        ..SourceInput::default()
    };

    let ingestor = Ingestor::new(&config)?;
    let report = ingestor.ingest("acme", "bot1", &input).await?;

    assert_eq!(
        report.sources[0].outcome,
        SourceIngestOutcome::Indexed {
            chunks: 25,
            vectors_upserted: 25,
        }
    );

    let bodies = upsert_bodies(&vector_server).await;
    let sizes: Vec<usize> = bodies
        .iter()
        .map(|body| body["vectors"].as_array().expect("vectors array").len())
        .collect();
    assert_eq!(sizes, vec![10, 10, 5]);

    let all_ids: Vec<String> = bodies.iter().flat_map(vector_ids).collect();
    let expected: Vec<String> = (0..25).map(|i| format!("0_{i}")).collect();
    assert_eq!(all_ids, expected);

    Ok(())
}

#[tokio::test]
async fn reingesting_the_same_source_produces_identical_ids() -> Result<()> {
    let embedding_server = start_embedding_server().await;
    let vector_server = start_vector_server().await;
    let config = test_config(&embedding_server.uri(), &vector_server.uri());

    let text = "The quick brown fox jumps over the lazy dog.";
    let input = SourceInput {
        raw_text: Some(text.to_string()),
        ..SourceInput::default()
    };

    let ingestor = Ingestor::new(&config)?;
    ingestor.ingest("acme", "bot1", &input).await?;
    ingestor.ingest("acme", "bot1", &input).await?;

    let bodies = upsert_bodies(&vector_server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(vector_ids(&bodies[0]), vector_ids(&bodies[1]));

    Ok(())
}

#[tokio::test]
async fn unreachable_url_does_not_abort_sibling_sources() -> Result<()> {
    let embedding_server = start_embedding_server().await;
    let vector_server = start_vector_server().await;
    let page_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&page_server)
        .await;

    let config = test_config(&embedding_server.uri(), &vector_server.uri());
    let ingestor = Ingestor::new(&config)?;

    let bad_url = format!("{}/missing", page_server.uri());
    let input = SourceInput {
        urls: vec![bad_url.clone()],
        raw_text: Some("Sibling text survives.".to_string()),
        ..SourceInput::default()
    };

    let report = ingestor.ingest("acme", "bot1", &input).await?;

    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.indexed_count(), 1);
    assert_eq!(report.sources[0].identifier, bad_url);
    assert!(matches!(
        report.sources[0].outcome,
        SourceIngestOutcome::Failed { .. }
    ));

    let bodies = upsert_bodies(&vector_server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(vector_ids(&bodies[0]), vec!["0_0".to_string()]);

    Ok(())
}

#[tokio::test]
async fn embedding_failure_fails_the_source_without_upserting() -> Result<()> {
    let embedding_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid input"))
        .mount(&embedding_server)
        .await;

    let vector_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(UpsertResponder)
        .expect(0)
        .mount(&vector_server)
        .await;

    let config = test_config(&embedding_server.uri(), &vector_server.uri());
    let ingestor = Ingestor::new(&config)?;
    let input = SourceInput {
        raw_text: Some("Some text.".to_string()),
        ..SourceInput::default()
    };

    let report = ingestor.ingest("acme", "bot1", &input).await?;

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.indexed_count(), 0);

    Ok(())
}

#[tokio::test]
async fn upsert_failure_aborts_the_ingestion_call() -> Result<()> {
    let embedding_server = start_embedding_server().await;

    // First flush succeeds, every later one is rejected
    let vector_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(UpsertResponder)
        .up_to_n_times(1)
        .mount(&vector_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(400).set_body_string("quota exceeded"))
        .mount(&vector_server)
        .await;

    let mut config = test_config(&embedding_server.uri(), &vector_server.uri());
    config.chunking = ChunkingConfig {
        target_chunk_size: 50,
        overlap_size: 0,
    };
    config.ingest.upsert_batch_size = 2;

    let words: Vec<String> = (0..250).map(|i| format!("w{i}")).collect();
    let input = SourceInput {
        raw_text: Some(words.join(" ")),
        ..SourceInput::default()
    };

    let ingestor = Ingestor::new(&config)?;
    let result = ingestor.ingest("acme", "bot1", &input).await;

    assert!(result.is_err());

    // The first batch was already flushed and stays persisted
    let bodies = upsert_bodies(&vector_server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(vector_ids(&bodies[0]), vec!["0_0".to_string(), "0_1".to_string()]);

    Ok(())
}
