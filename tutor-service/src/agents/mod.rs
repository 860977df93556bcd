//! Prompt templates and response handling for each tutoring agent.
//!
//! An agent builds a prompt, hands it to the model, and turns the reply into
//! a domain value. When the reply cannot be used the agent substitutes static
//! content so the request still succeeds.

pub mod assignment;
pub mod feedback;
pub mod lesson;
pub mod tutor;

use crate::services::metrics::PARSE_FALLBACKS_TOTAL;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Tutor,
    Lesson,
    Assignment,
    Quiz,
    Feedback,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Tutor => "tutor",
            AgentKind::Lesson => "lesson",
            AgentKind::Assignment => "assignment",
            AgentKind::Quiz => "quiz",
            AgentKind::Feedback => "feedback",
        }
    }
}

/// A parsed agent result.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput<T> {
    pub value: T,
    /// False when `value` is the static fallback.
    pub generated: bool,
}

impl<T> AgentOutput<T> {
    pub fn generated(value: T) -> Self {
        Self {
            value,
            generated: true,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            generated: false,
        }
    }
}

/// Use the parsed value when there is one, otherwise the fallback.
pub(crate) fn parse_or_fallback<T>(
    agent: AgentKind,
    parsed: Option<T>,
    fallback: impl FnOnce() -> T,
) -> AgentOutput<T> {
    match parsed {
        Some(value) => AgentOutput::generated(value),
        None => {
            warn!(agent = agent.as_str(), "Model response unusable, using fallback");
            PARSE_FALLBACKS_TOTAL
                .with_label_values(&[agent.as_str()])
                .inc();
            AgentOutput::fallback(fallback())
        }
    }
}

/// Optional learner context shared by several prompts.
pub(crate) fn student_context(student: Option<&crate::models::Student>) -> String {
    let Some(student) = student else {
        return String::new();
    };

    let mut lines = vec![format!("The student's name is {}.", student.display_name)];
    if let Some(grade) = student.grade_level.as_deref().filter(|g| !g.is_empty()) {
        lines.push(format!("They are at grade level: {}.", grade));
    }
    if let Some(goals) = student.learning_goals.as_deref().filter(|g| !g.is_empty()) {
        lines.push(format!("Their learning goals: {}.", goals));
    }
    if !student.interests.is_empty() {
        lines.push(format!(
            "Their interests include {}. Use these for examples when it helps.",
            student.interests.join(", ")
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::Student;
    use chrono::Utc;
    use uuid::Uuid;

    pub fn student() -> Student {
        Student {
            student_id: Uuid::new_v4(),
            display_name: "Maya".to_string(),
            grade_level: Some("7th grade".to_string()),
            learning_goals: Some("pass the algebra exam".to_string()),
            interests: vec!["soccer".to_string(), "space".to_string()],
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        }
    }
}
