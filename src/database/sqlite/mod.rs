use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::database::sqlite::models::{
    Conversation, Customization, Message, NewCustomization, NewMessage,
};
use crate::database::sqlite::queries::{ConversationQueries, CustomizationQueries, MessageQueries};


pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("history.db");
        let db_url = db_path.to_string_lossy();

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(db_url.as_ref()).await
    }

    pub async fn begin_transaction(&self) -> Result<Transaction<'_, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    // Message operations
    pub async fn append_message(&self, new_message: NewMessage) -> Result<Message> {
        MessageQueries::append(&self.pool, new_message).await
    }

    pub async fn conversation_messages(
        &self,
        tenant: &str,
        visitor_id: &str,
        chatbot_id: &str,
    ) -> Result<Vec<Message>> {
        MessageQueries::list_for_conversation(&self.pool, tenant, visitor_id, chatbot_id).await
    }

    // Conversation operations
    pub async fn get_conversation(
        &self,
        tenant: &str,
        visitor_id: &str,
        chatbot_id: &str,
    ) -> Result<Option<Conversation>> {
        ConversationQueries::get(&self.pool, tenant, visitor_id, chatbot_id).await
    }

    pub async fn list_conversations(
        &self,
        tenant: &str,
        chatbot_id: &str,
    ) -> Result<Vec<Conversation>> {
        ConversationQueries::list_for_chatbot(&self.pool, tenant, chatbot_id).await
    }

    // Customization operations
    pub async fn get_customization(
        &self,
        tenant: &str,
        chatbot_id: &str,
    ) -> Result<Option<Customization>> {
        CustomizationQueries::get(&self.pool, tenant, chatbot_id).await
    }

    pub async fn upsert_customization(&self, new: NewCustomization) -> Result<Customization> {
        CustomizationQueries::upsert(&self.pool, new).await
    }
}
