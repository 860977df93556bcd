use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Assignment, Difficulty, LessonContent, Question, QuestionKind, Submission};

pub const DEFAULT_ASSIGNMENT_QUESTIONS: u32 = 5;
pub const DEFAULT_QUIZ_QUESTIONS: u32 = 5;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 100, message = "Subject must be 1-100 characters"))]
    pub subject: String,
    #[validate(length(min = 1, max = 200, message = "Topic must be 1-200 characters"))]
    pub topic: String,
    pub difficulty: Option<Difficulty>,
    #[validate(length(max = 1000))]
    pub focus: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LessonResponse {
    pub lesson_id: Uuid,
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    #[serde(flatten)]
    pub content: LessonContent,
    pub generated: bool,
    pub created_utc: DateTime<Utc>,
}

impl From<crate::models::Lesson> for LessonResponse {
    fn from(lesson: crate::models::Lesson) -> Self {
        Self {
            lesson_id: lesson.lesson_id,
            subject: lesson.subject,
            topic: lesson.topic,
            difficulty: lesson.difficulty,
            content: lesson.content.0,
            generated: lesson.generated,
            created_utc: lesson.created_utc,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 100, message = "Subject must be 1-100 characters"))]
    pub subject: String,
    #[validate(length(min = 1, max = 200, message = "Topic must be 1-200 characters"))]
    pub topic: String,
    pub difficulty: Option<Difficulty>,
    #[validate(range(min = 1, max = 20, message = "question_count must be between 1 and 20"))]
    pub question_count: Option<u32>,
    /// Base the questions on a stored lesson.
    pub lesson_id: Option<Uuid>,
}

/// Quizzes pick their own difficulty from recent scores.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 100, message = "Subject must be 1-100 characters"))]
    pub subject: String,
    #[validate(length(min = 1, max = 200, message = "Topic must be 1-200 characters"))]
    pub topic: String,
    #[validate(range(min = 1, max = 10, message = "question_count must be between 1 and 10"))]
    pub question_count: Option<u32>,
    pub lesson_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswersRequest {
    /// Answers keyed by question id.
    #[validate(length(min = 1, max = 50, message = "Provide between 1 and 50 answers"))]
    pub answers: HashMap<String, String>,
}

/// A question as shown to the student. Answer fields are only present once
/// the assignment has been submitted.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub points: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_answers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionView {
    pub fn new(question: &Question, reveal: bool) -> Self {
        Self {
            id: question.id.clone(),
            kind: question.kind,
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            points: question.points,
            answer: reveal.then(|| question.answer.clone()),
            accepted_answers: reveal.then(|| question.accepted_answers.clone()),
            explanation: reveal.then(|| question.explanation.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssignmentView {
    pub assignment_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub kind: String,
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    pub title: String,
    pub instructions: String,
    pub total_points: i32,
    pub generated: bool,
    pub answers_revealed: bool,
    pub questions: Vec<QuestionView>,
    pub created_utc: DateTime<Utc>,
}

impl AssignmentView {
    pub fn new(assignment: &Assignment, reveal: bool) -> Self {
        Self {
            assignment_id: assignment.assignment_id,
            lesson_id: assignment.lesson_id,
            kind: assignment.kind.clone(),
            subject: assignment.subject.clone(),
            topic: assignment.topic.clone(),
            difficulty: assignment.difficulty.clone(),
            title: assignment.title.clone(),
            instructions: assignment.instructions.clone(),
            total_points: assignment.total_points,
            generated: assignment.generated,
            answers_revealed: reveal,
            questions: assignment
                .questions
                .0
                .iter()
                .map(|q| QuestionView::new(q, reveal))
                .collect(),
            created_utc: assignment.created_utc,
        }
    }
}

/// Assignment list entries omit the questions.
#[derive(Debug, Serialize)]
pub struct AssignmentSummary {
    pub assignment_id: Uuid,
    pub kind: String,
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    pub title: String,
    pub question_count: usize,
    pub total_points: i32,
    pub created_utc: DateTime<Utc>,
}

impl From<&Assignment> for AssignmentSummary {
    fn from(a: &Assignment) -> Self {
        Self {
            assignment_id: a.assignment_id,
            kind: a.kind.clone(),
            subject: a.subject.clone(),
            topic: a.topic.clone(),
            difficulty: a.difficulty.clone(),
            title: a.title.clone(),
            question_count: a.questions.0.len(),
            total_points: a.total_points,
            created_utc: a.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub submission: Submission,
    /// Difficulty the next quiz in this subject will use.
    pub next_difficulty: Difficulty,
    pub feedback_generated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: "q1".to_string(),
            kind: QuestionKind::MultipleChoice,
            prompt: "2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            answer: "B".to_string(),
            accepted_answers: vec![],
            explanation: "Basic addition".to_string(),
            points: 1,
        }
    }

    #[test]
    fn hidden_question_omits_answer_fields() {
        let json = serde_json::to_value(QuestionView::new(&question(), false)).unwrap();
        assert!(json.get("answer").is_none());
        assert!(json.get("explanation").is_none());
        assert_eq!(json["options"][1], "4");
    }

    #[test]
    fn revealed_question_includes_answer() {
        let json = serde_json::to_value(QuestionView::new(&question(), true)).unwrap();
        assert_eq!(json["answer"], "B");
        assert_eq!(json["explanation"], "Basic addition");
    }

    #[test]
    fn submit_requires_answers() {
        let req = SubmitAnswersRequest {
            answers: HashMap::new(),
        };
        assert!(req.validate().is_err());
    }
}
