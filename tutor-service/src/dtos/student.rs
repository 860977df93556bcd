use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{FeedbackContent, SubjectProgress};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: String,
    #[validate(length(max = 50))]
    pub grade_level: Option<String>,
    #[validate(length(max = 1000))]
    pub learning_goals: Option<String>,
    #[validate(length(max = 20, message = "At most 20 interests"))]
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RequestFeedbackRequest {
    /// Limit the review to one subject.
    #[validate(length(min = 1, max = 100))]
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubjectProgressView {
    #[serde(flatten)]
    pub progress: SubjectProgress,
    pub recommended_difficulty: crate::models::Difficulty,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub total_attempts: i64,
    /// Attempt-weighted mean over all subjects.
    pub overall_average: f64,
    pub subjects: Vec<SubjectProgressView>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback_id: uuid::Uuid,
    pub subject: Option<String>,
    #[serde(flatten)]
    pub content: FeedbackContent,
    pub generated: bool,
    pub created_utc: chrono::DateTime<chrono::Utc>,
}

impl From<crate::models::Feedback> for FeedbackResponse {
    fn from(f: crate::models::Feedback) -> Self {
        Self {
            feedback_id: f.feedback_id,
            subject: f.subject,
            content: f.content.0,
            generated: f.generated,
            created_utc: f.created_utc,
        }
    }
}
