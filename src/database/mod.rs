// Database module
// This module handles the dual database system (SQLite for chat history, Pinecone for vectors)

pub mod pinecone;
pub mod sqlite;

pub use pinecone::{QueryMatch, RecordMetadata, VectorRecord, VectorStoreClient};
pub use sqlite::*;
