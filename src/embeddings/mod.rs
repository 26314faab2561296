// Embeddings module
// This module handles OpenAI integration and content chunking

pub mod chunking;
pub mod openai;

pub use chunking::{ChunkingConfig, ContentChunk, chunk_text, truncate_to_trailing_bytes};
pub use openai::{DEFAULT_EMBEDDING_DIMENSION, EmbeddingClient};
