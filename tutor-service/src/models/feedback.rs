use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Human-readable commentary on a student's work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackContent {
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub feedback_id: Uuid,
    pub student_id: Uuid,
    pub subject: Option<String>,
    pub content: Json<FeedbackContent>,
    pub generated: bool,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateFeedback {
    pub student_id: Uuid,
    pub subject: Option<String>,
    pub content: FeedbackContent,
    pub generated: bool,
}
