//! Store-level tests against a real database. Skipped without `TEST_DATABASE_URL`.

mod common;

use common::test_database;
use std::collections::HashMap;
use tutor_service::models::{
    AssignmentKind, CreateAssignment, CreateSession, CreateSubmission, Difficulty, UsageRecord,
};
use tutor_service::services::Database;
use uuid::Uuid;

async fn new_session(db: &Database, student_id: Uuid) -> Uuid {
    db.create_session(&CreateSession {
        student_id,
        title: "Fractions".to_string(),
        subject: "Math".to_string(),
        topic: None,
        system_prompt: "You are a tutor.".to_string(),
    })
    .await
    .expect("Failed to create session")
    .session_id
}

async fn graded_attempt(db: &Database, student_id: Uuid, subject: &str, score: f64) {
    let assignment = db
        .create_assignment(&CreateAssignment {
            student_id,
            lesson_id: None,
            kind: AssignmentKind::Quiz,
            subject: subject.to_string(),
            topic: "Fractions".to_string(),
            difficulty: Difficulty::Medium,
            title: "Quiz".to_string(),
            instructions: String::new(),
            questions: vec![],
            generated: false,
        })
        .await
        .expect("Failed to create assignment");

    db.create_submission(&CreateSubmission {
        assignment_id: assignment.assignment_id,
        student_id,
        subject: subject.to_string(),
        answers: HashMap::new(),
        results: vec![],
        earned_points: 0,
        total_points: 0,
        score,
        feedback: None,
    })
    .await
    .expect("Failed to create submission");
}

#[tokio::test]
async fn chat_turn_stores_messages_counters_and_usage_together() {
    let Some(db) = test_database().await else {
        return;
    };
    let student_id = Uuid::new_v4();
    let session_id = new_session(&db, student_id).await;
    let usage = UsageRecord::new(student_id, Some(session_id), "tutor", "mock-tutor", 12, 30);

    let (user, reply) = db
        .add_turn(session_id, "What is 1/2 + 1/4?", "3/4", &usage)
        .await
        .unwrap();
    assert_eq!(user.role, "user");
    assert_eq!(reply.role, "assistant");

    let messages = db.recent_messages(session_id, 10).await.unwrap();
    assert_eq!(
        messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
        vec!["What is 1/2 + 1/4?", "3/4"]
    );

    let session = db.get_session(student_id, session_id).await.unwrap().unwrap();
    assert_eq!(session.message_count, 2);
    assert_eq!(session.total_input_tokens, 12);
    assert_eq!(session.total_output_tokens, 30);
    assert_eq!(db.usage_for_student(student_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_chat_turn_leaves_no_partial_rows() {
    let Some(db) = test_database().await else {
        return;
    };
    let student_id = Uuid::new_v4();
    let session_id = new_session(&db, student_id).await;
    let usage = UsageRecord::new(student_id, Some(session_id), "tutor", "mock-tutor", 5, 5);

    // Postgres text cannot hold NUL, so the reply insert fails after the
    // user message was written inside the same transaction.
    let result = db
        .add_turn(session_id, "Hello", "bad\0reply", &usage)
        .await;
    assert!(result.is_err());

    assert!(db.recent_messages(session_id, 10).await.unwrap().is_empty());
    let session = db.get_session(student_id, session_id).await.unwrap().unwrap();
    assert_eq!(session.message_count, 0);
    assert_eq!(session.total_input_tokens, 0);
    assert!(db.usage_for_student(student_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn subject_progress_merges_subjects_that_differ_only_in_case() {
    let Some(db) = test_database().await else {
        return;
    };
    let student_id = Uuid::new_v4();
    graded_attempt(&db, student_id, "Math", 100.0).await;
    graded_attempt(&db, student_id, "Math", 100.0).await;
    graded_attempt(&db, student_id, "math", 0.0).await;
    graded_attempt(&db, student_id, "History", 40.0).await;

    let progress = db.subject_progress(student_id).await.unwrap();
    assert_eq!(progress.len(), 2);

    let math = progress
        .iter()
        .find(|p| p.subject.eq_ignore_ascii_case("math"))
        .unwrap();
    assert_eq!(math.subject, "math");
    assert_eq!(math.attempts, 3);
    assert_eq!(math.best_score, 100.0);
    assert_eq!(math.latest_score, 0.0);
    assert_eq!(math.recent_scores, vec![0.0, 100.0, 100.0]);
}

#[tokio::test]
async fn submission_listing_filters_by_subject_before_limiting() {
    let Some(db) = test_database().await else {
        return;
    };
    let student_id = Uuid::new_v4();
    graded_attempt(&db, student_id, "History", 70.0).await;
    for _ in 0..3 {
        graded_attempt(&db, student_id, "Math", 90.0).await;
    }

    let history = db
        .list_submissions(student_id, None, Some("history"), 2)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score, 70.0);
}
