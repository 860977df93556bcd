use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Body of a generated lesson, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonContent {
    pub title: String,
    pub summary: String,
    pub sections: Vec<LessonSection>,
    pub key_points: Vec<String>,
    pub practice_prompts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonSection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub lesson_id: Uuid,
    pub student_id: Uuid,
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    pub title: String,
    pub content: Json<LessonContent>,
    /// False when the static fallback was stored instead of model output.
    pub generated: bool,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateLesson {
    pub student_id: Uuid,
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    pub content: LessonContent,
    pub generated: bool,
}
