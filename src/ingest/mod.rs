// Vector upsert pipeline: chunk, embed, and batch-upsert source documents
// into the chatbot's namespace


use anyhow::Result;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::BackendError;
use crate::config::Config;
use crate::database::pinecone::{RecordMetadata, VectorRecord, VectorStoreClient};
use crate::embeddings::chunking::{self, ChunkingConfig, ContentChunk};
use crate::embeddings::openai::EmbeddingClient;
use crate::sources::{SourceDocument, SourceInput, SourceNormalizer, SourceOutcome};

/// Result of one source document in an ingestion batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceIngestOutcome {
    Indexed {
        chunks: usize,
        vectors_upserted: usize,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub identifier: String,
    pub outcome: SourceIngestOutcome,
}

/// Per-source outcomes of one ingestion call, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    #[inline]
    pub fn indexed_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, SourceIngestOutcome::Indexed { .. }))
            .count()
    }

    #[inline]
    pub fn failed_count(&self) -> usize {
        self.sources.len() - self.indexed_count()
    }
}

/// Drives the ingestion pipeline: normalize, chunk, embed, upsert.
pub struct Ingestor {
    embeddings: EmbeddingClient,
    vector_store: VectorStoreClient,
    normalizer: SourceNormalizer,
    chunking: ChunkingConfig,
    upsert_batch_size: usize,
    metadata_byte_limit: usize,
}

impl Ingestor {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            embeddings: EmbeddingClient::new(&config.embeddings)?,
            vector_store: VectorStoreClient::new(&config.vector_store)?,
            normalizer: SourceNormalizer::new()?,
            chunking: config.chunking.clone(),
            upsert_batch_size: config.ingest.upsert_batch_size,
            metadata_byte_limit: config.ingest.metadata_byte_limit,
        })
    }

    /// Ingest every source in `input` into the chatbot's namespace.
    ///
    /// Unreachable sources and failed embeddings are reported per source and
    /// do not affect siblings. A failed vector upsert aborts the whole call;
    /// batches flushed before the failure stay persisted, and re-ingesting
    /// the same source overwrites them under the same ids.
    #[inline]
    pub async fn ingest(
        &self,
        tenant: &str,
        chatbot_id: &str,
        input: &SourceInput,
    ) -> Result<IngestReport> {
        info!(
            "Ingesting {} sources for tenant '{}' into namespace '{}'",
            input.source_count(),
            tenant,
            chatbot_id
        );

        let outcomes = self.normalizer.normalize(input).await;
        let mut report = IngestReport::default();

        for outcome in outcomes {
            match outcome {
                SourceOutcome::Failed { identifier, reason } => {
                    report.sources.push(SourceReport {
                        identifier,
                        outcome: SourceIngestOutcome::Failed { reason },
                    });
                }
                SourceOutcome::Loaded(document) => {
                    match self.ingest_document(tenant, chatbot_id, &document).await {
                        Ok((chunks, vectors_upserted)) => {
                            report.sources.push(SourceReport {
                                identifier: document.identifier,
                                outcome: SourceIngestOutcome::Indexed {
                                    chunks,
                                    vectors_upserted,
                                },
                            });
                        }
                        Err(err) => {
                            if matches!(
                                err.downcast_ref::<BackendError>(),
                                Some(BackendError::Upsert(_))
                            ) {
                                error!(
                                    "Vector upsert failed for source '{}', aborting ingestion: {:#}",
                                    document.identifier, err
                                );
                                return Err(err);
                            }

                            warn!(
                                "Failed to ingest source '{}': {:#}",
                                document.identifier, err
                            );
                            report.sources.push(SourceReport {
                                identifier: document.identifier,
                                outcome: SourceIngestOutcome::Failed {
                                    reason: format!("{err:#}"),
                                },
                            });
                        }
                    }
                }
            }
        }

        info!(
            "Ingestion finished: {} indexed, {} failed",
            report.indexed_count(),
            report.failed_count()
        );
        Ok(report)
    }

    /// Chunk, embed, and upsert one source document.
    async fn ingest_document(
        &self,
        tenant: &str,
        namespace: &str,
        document: &SourceDocument,
    ) -> Result<(usize, usize)> {
        let chunks = chunking::chunk_text(&document.text, &self.chunking)?;
        debug!(
            "Source '{}' produced {} chunks",
            document.identifier,
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = self.embeddings.embed_batch(&texts).await.map_err(|err| {
            anyhow::Error::from(BackendError::Embedding(format!(
                "Embedding failed for source '{}': {err:#}",
                document.identifier
            )))
        })?;

        let stored_text =
            chunking::truncate_to_trailing_bytes(&document.text, self.metadata_byte_limit);

        let mut upserted = 0;
        let mut batch: Vec<VectorRecord> =
            Vec::with_capacity(self.upsert_batch_size.min(chunks.len()));

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            batch.push(build_record(tenant, document, chunk, embedding, stored_text));

            if batch.len() == self.upsert_batch_size {
                upserted += self.flush(namespace, &batch).await?;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            upserted += self.flush(namespace, &batch).await?;
        }

        info!(
            "Indexed source '{}': {} chunks, {} vectors upserted",
            document.identifier,
            chunks.len(),
            upserted
        );
        Ok((chunks.len(), upserted))
    }

    async fn flush(&self, namespace: &str, batch: &[VectorRecord]) -> Result<usize> {
        self.vector_store
            .upsert(namespace, batch)
            .await
            .map_err(|err| anyhow::Error::from(BackendError::Upsert(format!("{err:#}"))))
    }
}

/// Deterministic record id: re-ingesting the same source overwrites its
/// existing vectors instead of duplicating them.
#[inline]
pub fn record_id(source_identifier: &str, chunk_index: usize) -> String {
    format!("{source_identifier}_{chunk_index}")
}

fn build_record(
    tenant: &str,
    document: &SourceDocument,
    chunk: &ContentChunk,
    embedding: Vec<f32>,
    stored_text: &str,
) -> VectorRecord {
    VectorRecord {
        id: record_id(&document.identifier, chunk.chunk_index),
        values: embedding,
        metadata: RecordMetadata {
            page_content: chunk.content.clone(),
            txt_path: document.identifier.clone(),
            client_name: tenant.to_string(),
            loc: json!({"from": chunk.byte_start, "to": chunk.byte_end}).to_string(),
            text: stored_text.to_string(),
        },
    }
}
