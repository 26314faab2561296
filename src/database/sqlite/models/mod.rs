
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: i64,
    pub tenant: String,
    pub visitor_id: String,
    pub chatbot_id: String,
    pub created_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Sender {
    Visitor,
    Assistant,
}

impl std::fmt::Display for Sender {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Sender::Visitor => write!(f, "Visitor"),
            Sender::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One stored turn of a conversation. `seq` is the insertion-ordered row id,
/// `id` the externally visible message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub seq: i64,
    pub id: String,
    pub conversation_id: i64,
    pub sender: Sender,
    pub text: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub tenant: String,
    pub visitor_id: String,
    pub chatbot_id: String,
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customization {
    pub tenant: String,
    pub chatbot_id: String,
    pub system_prompt: String,
    pub updated_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomization {
    pub tenant: String,
    pub chatbot_id: String,
    pub system_prompt: String,
}

impl Message {
    #[inline]
    pub fn is_from_visitor(&self) -> bool {
        self.sender == Sender::Visitor
    }
}
