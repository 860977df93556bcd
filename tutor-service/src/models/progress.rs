use serde::Serialize;
use sqlx::FromRow;

/// Aggregate of a student's graded submissions in one subject.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubjectProgress {
    pub subject: String,
    pub attempts: i64,
    pub average_score: f64,
    pub best_score: f64,
    pub latest_score: f64,
    /// Newest first, at most the difficulty window.
    pub recent_scores: Vec<f64>,
}
