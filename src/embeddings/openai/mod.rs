#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::EmbeddingsConfig;
use crate::net;

/// Vector width produced by the default `text-embedding-ada-002` model.
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;

#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    endpoint: Url,
    model: String,
    dimension: u32,
    api_key: String,
    client: reqwest::Client,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    #[inline]
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid embeddings endpoint: {}", config.endpoint))?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            dimension: config.dimension,
            api_key: config.api_key.clone(),
            client: net::default_client()?,
            retry_attempts: net::DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Generate embeddings for a batch of texts with a single API call.
    ///
    /// Newlines in each text are replaced with spaces before submission, and
    /// the returned vectors preserve input order.
    #[inline]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let inputs: Vec<String> = texts.iter().map(|text| text.replace('\n', " ")).collect();
        let request = EmbeddingRequest {
            input: inputs,
            model: self.model.clone(),
        };

        let url = self
            .endpoint
            .join("/v1/embeddings")
            .context("Failed to build embeddings URL")?;

        let response = net::send_with_retry(
            self.client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(&request),
            self.retry_attempts,
            "Embedding",
        )
        .await?;

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        if parsed.data.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                parsed.data.len()
            ));
        }

        let embeddings: Vec<Vec<f32>> = parsed
            .data
            .into_iter()
            .map(|data| data.embedding)
            .collect();

        for embedding in &embeddings {
            if embedding.len() != self.dimension as usize {
                return Err(anyhow::anyhow!(
                    "Embedding has {} dimensions, expected {}",
                    embedding.len(),
                    self.dimension
                ));
            }
        }

        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    /// Generate an embedding for a single query string.
    #[inline]
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding response contained no vectors"))
    }
}
