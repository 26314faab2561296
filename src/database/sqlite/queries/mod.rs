#[cfg(test)]
mod tests;

use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

pub struct ConversationQueries;

impl ConversationQueries {
    #[inline]
    pub async fn get(
        pool: &SqlitePool,
        tenant: &str,
        visitor_id: &str,
        chatbot_id: &str,
    ) -> Result<Option<Conversation>> {
        let result = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id,
                   tenant,
                   visitor_id,
                   chatbot_id,
                   created_date,
                   last_modified
            FROM conversations
            WHERE tenant = ? AND visitor_id = ? AND chatbot_id = ?
            "#,
        )
        .bind(tenant)
        .bind(visitor_id)
        .bind(chatbot_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get conversation")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_for_chatbot(
        pool: &SqlitePool,
        tenant: &str,
        chatbot_id: &str,
    ) -> Result<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id,
                   tenant,
                   visitor_id,
                   chatbot_id,
                   created_date,
                   last_modified
            FROM conversations
            WHERE tenant = ? AND chatbot_id = ?
            ORDER BY last_modified DESC
            "#,
        )
        .bind(tenant)
        .bind(chatbot_id)
        .fetch_all(pool)
        .await
        .context("Failed to list conversations for chatbot")?;

        Ok(conversations)
    }
}

pub struct MessageQueries;

impl MessageQueries {
    /// Append a turn to its conversation, creating the conversation row on
    /// first contact. The insert and the conversation timestamp update are
    /// committed atomically.
    #[inline]
    pub async fn append(pool: &SqlitePool, new_message: NewMessage) -> Result<Message> {
        let mut transaction = pool
            .begin()
            .await
            .context("Failed to begin transaction for message append")?;

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO conversations (tenant, visitor_id, chatbot_id, created_date, last_modified)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(tenant, visitor_id, chatbot_id) DO NOTHING
            "#,
        )
        .bind(&new_message.tenant)
        .bind(&new_message.visitor_id)
        .bind(&new_message.chatbot_id)
        .bind(now)
        .bind(now)
        .execute(&mut *transaction)
        .await
        .context("Failed to ensure conversation")?;

        let conversation_id: i64 = sqlx::query_scalar(
            "SELECT id FROM conversations WHERE tenant = ? AND visitor_id = ? AND chatbot_id = ?",
        )
        .bind(&new_message.tenant)
        .bind(&new_message.visitor_id)
        .bind(&new_message.chatbot_id)
        .fetch_one(&mut *transaction)
        .await
        .context("Failed to look up conversation")?;

        let id = Uuid::new_v4().to_string();
        let seq = sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender, text, created_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(new_message.sender)
        .bind(&new_message.text)
        .bind(now)
        .execute(&mut *transaction)
        .await
        .context("Failed to insert message")?
        .last_insert_rowid();

        sqlx::query("UPDATE conversations SET last_modified = ? WHERE id = ?")
            .bind(now)
            .bind(conversation_id)
            .execute(&mut *transaction)
            .await
            .context("Failed to update conversation timestamp")?;

        transaction
            .commit()
            .await
            .context("Failed to commit message append")?;

        debug!(
            "Appended message {} to conversation {}",
            id, conversation_id
        );

        Ok(Message {
            seq,
            id,
            conversation_id,
            sender: new_message.sender,
            text: new_message.text,
            created_date: now,
        })
    }

    #[inline]
    pub async fn list_for_conversation(
        pool: &SqlitePool,
        tenant: &str,
        visitor_id: &str,
        chatbot_id: &str,
    ) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.seq,
                   m.id,
                   m.conversation_id,
                   m.sender,
                   m.text,
                   m.created_date
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE c.tenant = ? AND c.visitor_id = ? AND c.chatbot_id = ?
            ORDER BY m.seq ASC
            "#,
        )
        .bind(tenant)
        .bind(visitor_id)
        .bind(chatbot_id)
        .fetch_all(pool)
        .await
        .context("Failed to list messages for conversation")?;

        Ok(messages)
    }
}

pub struct CustomizationQueries;

impl CustomizationQueries {
    #[inline]
    pub async fn upsert(pool: &SqlitePool, new: NewCustomization) -> Result<Customization> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO customizations (tenant, chatbot_id, system_prompt, updated_date)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(tenant, chatbot_id) DO UPDATE
            SET system_prompt = excluded.system_prompt,
                updated_date = excluded.updated_date
            "#,
        )
        .bind(&new.tenant)
        .bind(&new.chatbot_id)
        .bind(&new.system_prompt)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to upsert customization")?;

        Ok(Customization {
            tenant: new.tenant,
            chatbot_id: new.chatbot_id,
            system_prompt: new.system_prompt,
            updated_date: now,
        })
    }

    #[inline]
    pub async fn get(
        pool: &SqlitePool,
        tenant: &str,
        chatbot_id: &str,
    ) -> Result<Option<Customization>> {
        let result = sqlx::query_as::<_, Customization>(
            r#"
            SELECT tenant,
                   chatbot_id,
                   system_prompt,
                   updated_date
            FROM customizations
            WHERE tenant = ? AND chatbot_id = ?
            "#,
        )
        .bind(tenant)
        .bind(chatbot_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get customization")?;

        Ok(result)
    }
}
