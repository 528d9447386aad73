use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database-agnostic message model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: MessageRole,
    pub content: String,
    /// Per-thread ordering key, allocated by the store starting at 1.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        thread_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
        sequence: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            role,
            content: content.into(),
            sequence,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Conversion: Message → hanron_llm::Message
impl From<&Message> for hanron_llm::Message {
    fn from(msg: &Message) -> Self {
        match msg.role {
            MessageRole::System => hanron_llm::Message::system(msg.content.clone()),
            MessageRole::User => hanron_llm::Message::human(msg.content.clone()),
            MessageRole::Assistant => hanron_llm::Message::ai(msg.content.clone()),
        }
    }
}
