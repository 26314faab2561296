
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::VectorStoreConfig;
use crate::net;

/// A single vector ready to be written to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// Metadata stored alongside each vector and returned with query matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordMetadata {
    #[serde(rename = "pageContent")]
    pub page_content: String,
    #[serde(rename = "txtPath")]
    pub txt_path: String,
    #[serde(rename = "clientName")]
    pub client_name: String,
    pub loc: String,
    pub text: String,
}

/// A scored match returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<RecordMetadata>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount")]
    upserted_count: u64,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeValues")]
    include_values: bool,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Clone)]
pub struct VectorStoreClient {
    index_url: Url,
    api_key: String,
    client: reqwest::Client,
    retry_attempts: u32,
}

impl VectorStoreClient {
    #[inline]
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        let index_url = config
            .index_url()
            .with_context(|| format!("Invalid vector index URL for index: {}", config.index_name))?;

        Ok(Self {
            index_url,
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

    /// Write a batch of vectors into the given namespace.
    ///
    /// Upserts are idempotent per vector id: writing an id again overwrites
    /// the stored values and metadata. Returns the count reported by the
    /// index.
    #[inline]
    pub async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            debug!("No vectors to upsert");
            return Ok(0);
        }

        if let Some(first) = records.first() {
            let dimension = first.values.len();
            if let Some(odd) = records.iter().find(|r| r.values.len() != dimension) {
                return Err(anyhow::anyhow!(
                    "Vector '{}' has {} dimensions, expected {}",
                    odd.id,
                    odd.values.len(),
                    dimension
                ));
            }
        }

        debug!(
            "Upserting {} vectors into namespace '{}'",
            records.len(),
            namespace
        );

        let url = self
            .index_url
            .join("/vectors/upsert")
            .context("Failed to build upsert URL")?;

        let request = UpsertRequest {
            vectors: records,
            namespace,
        };

        let response = net::send_with_retry(
            self.client
                .post(url)
                .header("Api-Key", &self.api_key)
                .json(&request),
            self.retry_attempts,
            "Vector upsert",
        )
        .await?;

        let parsed: UpsertResponse = response
            .json()
            .await
            .context("Failed to parse upsert response")?;

        debug!("Upserted {} vectors", parsed.upserted_count);
        Ok(parsed.upserted_count as usize)
    }

    /// Query the namespace for the vectors closest to `vector`.
    ///
    /// Matches are returned in descending score order with their stored
    /// values and metadata included.
    #[inline]
    pub async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>> {
        debug!(
            "Querying namespace '{}' for top {} matches",
            namespace, top_k
        );

        let url = self
            .index_url
            .join("/query")
            .context("Failed to build query URL")?;

        let request = QueryRequest {
            vector,
            top_k,
            include_values: true,
            include_metadata: true,
            namespace,
        };

        let response = net::send_with_retry(
            self.client
                .post(url)
                .header("Api-Key", &self.api_key)
                .json(&request),
            self.retry_attempts,
            "Vector query",
        )
        .await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .context("Failed to parse query response")?;

        debug!("Query returned {} matches", parsed.matches.len());
        Ok(parsed.matches)
    }
}
