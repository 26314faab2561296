use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackendError>;

/// Crate-wide error taxonomy.
///
/// Per-source ingestion failures (unreachable URL, unparsable file) are not
/// errors at this level: they are reported as failed
/// [`sources::SourceOutcome`]s so sibling sources keep going.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector upsert error: {0}")]
    Upsert(String),

    #[error("Vector query error: {0}")]
    VectorQuery(String),

    #[error("No customization found for tenant '{tenant}' and chatbot '{chatbot_id}'")]
    MissingCustomization { tenant: String, chatbot_id: String },

    #[error("Chat service error: {0}")]
    ChatService(String),

    #[error("History store error: {0}")]
    HistoryStore(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod answer;
pub mod chat;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod ingest;
pub mod net;
pub mod sources;
