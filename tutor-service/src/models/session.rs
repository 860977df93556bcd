//! Tutor conversation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted conversation between a student and the tutor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TutorSession {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub subject: String,
    pub topic: Option<String>,
    /// Persona and context instructions replayed on every turn.
    #[serde(skip_serializing)]
    pub system_prompt: String,
    pub message_count: i32,
    pub total_input_tokens: i32,
    pub total_output_tokens: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionMessage {
    pub message_id: Uuid,
    pub session_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_utc: DateTime<Utc>,
}

impl SessionMessage {
    pub fn role(&self) -> MessageRole {
        MessageRole::from_string(&self.role)
    }
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub student_id: Uuid,
    pub title: String,
    pub subject: String,
    pub topic: Option<String>,
    pub system_prompt: String,
}
