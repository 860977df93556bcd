use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A learner profile. `student_id` is the subject of the caller's token.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub student_id: Uuid,
    pub display_name: String,
    pub grade_level: Option<String>,
    pub learning_goals: Option<String>,
    pub interests: Vec<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating or replacing a profile.
#[derive(Debug, Clone)]
pub struct UpsertStudent {
    pub student_id: Uuid,
    pub display_name: String,
    pub grade_level: Option<String>,
    pub learning_goals: Option<String>,
    pub interests: Vec<String>,
}
