// Retrieval and answer pipeline: embed the question, query the chatbot's
// namespace, and complete against the assembled prompt


use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::{debug, info};

use crate::BackendError;
use crate::chat::{self, ChatClient, ChatMessage};
use crate::config::Config;
use crate::database::pinecone::VectorStoreClient;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{Message, NewMessage, Sender};
use crate::embeddings::openai::EmbeddingClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRequest {
    pub tenant: String,
    pub chatbot_id: String,
    pub visitor_id: String,
    pub question: String,
}

/// Terminal outcome of an answer request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered {
        reply: String,
        /// Identifier of the persisted assistant turn
        message_id: String,
    },
    /// The namespace held nothing near the question; the chat service was
    /// not invoked.
    NoContext,
}

/// Answers visitor questions with retrieved context and records both sides
/// of the exchange.
pub struct Responder {
    embeddings: EmbeddingClient,
    vector_store: VectorStoreClient,
    chat: ChatClient,
    database: Database,
    top_k: usize,
}

impl Responder {
    #[inline]
    pub fn new(config: &Config, database: Database) -> Result<Self> {
        Ok(Self {
            embeddings: EmbeddingClient::new(&config.embeddings)?,
            vector_store: VectorStoreClient::new(&config.vector_store)?,
            chat: ChatClient::new(&config.chat)?,
            database,
            top_k: config.retrieval.top_k,
        })
    }

    /// Run the full answer flow for one question.
    ///
    /// The question is persisted before anything that can fail, so a failed
    /// answer never loses it. Missing customization, embedding, query, and
    /// chat failures all surface after that point.
    #[inline]
    pub async fn answer(&self, request: &AnswerRequest) -> Result<AnswerOutcome> {
        let question_turn = self
            .database
            .append_message(NewMessage {
                tenant: request.tenant.clone(),
                visitor_id: request.visitor_id.clone(),
                chatbot_id: request.chatbot_id.clone(),
                sender: Sender::Visitor,
                text: request.question.clone(),
            })
            .await
            .map_err(|err| {
                anyhow::Error::from(BackendError::HistoryStore(format!(
                    "Failed to record question: {err:#}"
                )))
            })?;

        let customization = self
            .database
            .get_customization(&request.tenant, &request.chatbot_id)
            .await
            .context("Failed to load customization")?
            .ok_or_else(|| BackendError::MissingCustomization {
                tenant: request.tenant.clone(),
                chatbot_id: request.chatbot_id.clone(),
            })?;

        let vector = self
            .embeddings
            .embed_query(&request.question)
            .await
            .map_err(|err| {
                anyhow::Error::from(BackendError::Embedding(format!(
                    "Failed to embed question: {err:#}"
                )))
            })?;

        let matches = self
            .vector_store
            .query(&request.chatbot_id, &vector, self.top_k)
            .await
            .map_err(|err| anyhow::Error::from(BackendError::VectorQuery(format!("{err:#}"))))?;

        if matches.is_empty() {
            info!(
                "No relevant context in namespace '{}', skipping chat call",
                request.chatbot_id
            );
            return Ok(AnswerOutcome::NoContext);
        }

        let context = matches
            .iter()
            .filter_map(|m| m.metadata.as_ref())
            .map(|metadata| metadata.page_content.as_str())
            .join(" ");
        let sources = matches
            .iter()
            .filter_map(|m| m.metadata.as_ref())
            .map(|metadata| metadata.txt_path.as_str())
            .join(" ");
        debug!(
            "Assembled context from {} matches ({} bytes)",
            matches.len(),
            context.len()
        );

        let history = self.conversation_history(request, &question_turn.id).await?;
        let messages = chat::build_messages(
            chat::system_message(&customization.system_prompt, &context, &sources),
            &history,
            &request.question,
        );

        let reply = self.chat.complete(&messages).await.map_err(|err| {
            anyhow::Error::from(BackendError::ChatService(format!("{err:#}")))
        })?;

        let assistant_turn = self
            .database
            .append_message(NewMessage {
                tenant: request.tenant.clone(),
                visitor_id: request.visitor_id.clone(),
                chatbot_id: request.chatbot_id.clone(),
                sender: Sender::Assistant,
                text: reply.clone(),
            })
            .await
            .map_err(|err| {
                anyhow::Error::from(BackendError::HistoryStore(format!(
                    "Failed to record reply: {err:#}"
                )))
            })?;

        Ok(AnswerOutcome::Answered {
            reply,
            message_id: assistant_turn.id,
        })
    }

    /// Prior turns of the conversation in stored order, excluding the
    /// question appended by the current request.
    async fn conversation_history(
        &self,
        request: &AnswerRequest,
        current_question_id: &str,
    ) -> Result<Vec<ChatMessage>> {
        let turns = self
            .database
            .conversation_messages(&request.tenant, &request.visitor_id, &request.chatbot_id)
            .await
            .map_err(|err| {
                anyhow::Error::from(BackendError::HistoryStore(format!(
                    "Failed to load conversation history: {err:#}"
                )))
            })?;

        Ok(turns
            .into_iter()
            .filter(|turn| turn.id != current_question_id)
            .map(turn_to_chat_message)
            .collect())
    }
}

fn turn_to_chat_message(turn: Message) -> ChatMessage {
    match turn.sender {
        Sender::Visitor => ChatMessage::user(turn.text),
        Sender::Assistant => ChatMessage::assistant(turn.text),
    }
}
