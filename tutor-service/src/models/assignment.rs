//! Assignment, quiz and submission models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Difficulty tier used when generating questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// A homework-style assignment or a short adaptive quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    Assignment,
    Quiz,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::Assignment => "assignment",
            AssignmentKind::Quiz => "quiz",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "quiz" => AssignmentKind::Quiz,
            _ => AssignmentKind::Assignment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
    /// Alternate spellings or phrasings that also count as correct.
    #[serde(default)]
    pub accepted_answers: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    pub points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub kind: String,
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    pub title: String,
    pub instructions: String,
    pub questions: Json<Vec<Question>>,
    pub total_points: i32,
    pub generated: bool,
    pub created_utc: DateTime<Utc>,
}

impl Assignment {
    pub fn kind(&self) -> AssignmentKind {
        AssignmentKind::from_string(&self.kind)
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_string(&self.difficulty)
    }
}

#[derive(Debug, Clone)]
pub struct CreateAssignment {
    pub student_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub kind: AssignmentKind,
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub title: String,
    pub instructions: String,
    pub questions: Vec<Question>,
    pub generated: bool,
}

/// Outcome of grading a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub correct: bool,
    pub points_awarded: i32,
    pub points_possible: i32,
    pub given: Option<String>,
    pub expected: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub submission_id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub subject: String,
    pub answers: Json<HashMap<String, String>>,
    pub results: Json<Vec<QuestionResult>>,
    pub earned_points: i32,
    pub total_points: i32,
    pub score: f64,
    pub feedback: Option<Json<super::FeedbackContent>>,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSubmission {
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub subject: String,
    pub answers: HashMap<String, String>,
    pub results: Vec<QuestionResult>,
    pub earned_points: i32,
    pub total_points: i32,
    pub score: f64,
    pub feedback: Option<super::FeedbackContent>,
}
