use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{SessionMessage, TutorSession};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 100, message = "Subject must be 1-100 characters"))]
    pub subject: String,
    #[validate(length(max = 200))]
    pub topic: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    #[serde(flatten)]
    pub session: TutorSession,
    pub messages: Vec<SessionMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub user_message: SessionMessage,
    pub reply: SessionMessage,
    /// False when the tutor could not answer and a stock reply was used.
    pub generated: bool,
}
