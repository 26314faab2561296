
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::ChatConfig;
use crate::net;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// System instructions for one answer request: the chatbot's configured
/// prompt followed by the retrieved context and its source attribution.
#[inline]
pub fn system_message(system_prompt: &str, context: &str, sources: &str) -> ChatMessage {
    ChatMessage::system(format!(
        "{system_prompt}\nCONTEXT: {context}\nSOURCE: {sources}"
    ))
}

/// Assemble the full prompt: system instructions, then the prior turns in
/// stored order, then the current question as the final user message.
#[inline]
pub fn build_messages(
    system: ChatMessage,
    history: &[ChatMessage],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(system);
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(question));
    messages
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: Url,
    model: String,
    temperature: f32,
    api_key: String,
    client: reqwest::Client,
    retry_attempts: u32,
}

impl ChatClient {
    #[inline]
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid chat endpoint: {}", config.endpoint))?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
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

    /// Generate a completion for an assembled prompt at the configured
    /// sampling temperature.
    #[inline]
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(
            "Requesting chat completion with {} messages",
            messages.len()
        );

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream: false,
        };

        let url = self
            .endpoint
            .join("/v1/chat/completions")
            .context("Failed to build chat completions URL")?;

        let response = net::send_with_retry(
            self.client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(&request),
            self.retry_attempts,
            "Chat completion",
        )
        .await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("Chat completion response contained no choices"))?;

        debug!("Received chat reply of {} bytes", reply.len());
        Ok(reply)
    }
}
