//! End-to-end flows against a real database.
//!
//! Run with `TEST_DATABASE_URL=postgres://...`; each test skips when it is unset.

mod common;

use common::TestApp;
use serde_json::{json, Value};
use tutor_service::services::providers::ProviderError;

fn quiz_json() -> String {
    json!({
        "title": "Fractions check",
        "instructions": "Answer each question.",
        "questions": [
            {
                "kind": "multiple_choice",
                "prompt": "What is 1/2 + 1/4?",
                "options": ["A) 3/4", "B) 2/6", "C) 1/8"],
                "answer": "A",
                "explanation": "Use a common denominator of 4.",
                "points": 2
            },
            {
                "kind": "true_false",
                "prompt": "2/4 is equivalent to 1/2.",
                "answer": "true",
                "points": 1
            },
            {
                "kind": "short_answer",
                "prompt": "Name the bottom number of a fraction.",
                "answer": "denominator",
                "accepted_answers": ["the denominator"]
            }
        ]
    })
    .to_string()
}

fn feedback_json() -> String {
    json!({
        "summary": "Strong work on fractions.",
        "strengths": ["Common denominators"],
        "improvements": [],
        "next_steps": ["Try mixed numbers"]
    })
    .to_string()
}

#[tokio::test]
async fn profile_is_missing_until_saved() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app.get("/students/me").await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .put(
            "/students/me",
            json!({
                "display_name": "  Maya  ",
                "grade_level": "7",
                "interests": ["space", " ", "music"]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["display_name"], "Maya");
    assert_eq!(profile["interests"], json!(["space", "music"]));

    let response = app.get("/students/me").await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn tutor_chat_stores_both_turns_and_usage() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .post("/sessions", json!({"subject": "Math", "topic": "Fractions"}))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let session: Value = response.json().await.unwrap();
    let session_id = session["session_id"].as_str().unwrap().to_string();

    app.provider
        .push_response("Tutor: A fraction names equal parts of a whole.");
    let response = app
        .post(
            &format!("/sessions/{}/messages", session_id),
            json!({"content": "What is a fraction?"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let turn: Value = response.json().await.unwrap();
    assert_eq!(turn["reply"]["content"], "A fraction names equal parts of a whole.");
    assert_eq!(turn["reply"]["role"], "assistant");
    assert_eq!(turn["generated"], true);

    let prompts = app.provider.prompts();
    assert!(prompts.last().unwrap().contains("What is a fraction?"));

    let detail: Value = app
        .get(&format!("/sessions/{}", session_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["message_count"], 2);
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
    assert_eq!(detail["messages"][0]["role"], "user");

    let usage: Value = app.get("/usage").await.json().await.unwrap();
    assert_eq!(usage["total_requests"], 1);
    assert_eq!(usage["by_agent"]["tutor"]["requests"], 1);

    let response = app.delete(&format!("/sessions/{}", session_id)).await;
    assert_eq!(response.status().as_u16(), 204);
    let response = app.get(&format!("/sessions/{}", session_id)).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn failed_model_call_stores_nothing() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let session: Value = app
        .post("/sessions", json!({"subject": "Science"}))
        .await
        .json()
        .await
        .unwrap();
    let session_id = session["session_id"].as_str().unwrap().to_string();

    app.provider
        .push_error(ProviderError::NetworkError("connection reset".to_string()));
    let response = app
        .post(
            &format!("/sessions/{}/messages", session_id),
            json!({"content": "Why is the sky blue?"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 503);

    let detail: Value = app
        .get(&format!("/sessions/{}", session_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["message_count"], 0);
}

#[tokio::test]
async fn sessions_are_private_to_their_student() {
    let Some(owner) = TestApp::spawn().await else {
        return;
    };
    let Some(other) = TestApp::spawn().await else {
        return;
    };

    let session: Value = owner
        .post("/sessions", json!({"subject": "Art"}))
        .await
        .json()
        .await
        .unwrap();
    let path = format!("/sessions/{}", session["session_id"].as_str().unwrap());

    assert_eq!(other.get(&path).await.status().as_u16(), 404);
    assert_eq!(other.delete(&path).await.status().as_u16(), 404);
    assert_eq!(owner.get(&path).await.status().as_u16(), 200);
}

#[tokio::test]
async fn unparseable_lesson_falls_back_to_an_outline() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    app.provider.push_response("Sorry, I can't produce JSON today.");
    let response = app
        .post("/lessons", json!({"subject": "History", "topic": "The Silk Road"}))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let lesson: Value = response.json().await.unwrap();
    assert_eq!(lesson["generated"], false);
    assert_eq!(lesson["difficulty"], "medium");
    assert!(lesson["title"].as_str().unwrap().contains("The Silk Road"));

    let lessons: Value = app.get("/lessons?subject=history").await.json().await.unwrap();
    assert_eq!(lessons.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn quiz_submission_grades_and_raises_difficulty() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    app.provider.push_response(quiz_json());
    let response = app
        .post("/quizzes", json!({"subject": "Math", "topic": "Fractions", "question_count": 3}))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let quiz: Value = response.json().await.unwrap();
    assert_eq!(quiz["difficulty"], "medium");
    assert_eq!(quiz["kind"], "quiz");
    assert_eq!(quiz["total_points"], 4);
    assert_eq!(quiz["answers_revealed"], false);
    assert!(quiz["questions"][0].get("answer").is_none());
    assert_eq!(quiz["questions"][0]["options"][0], "3/4");
    let quiz_id = quiz["assignment_id"].as_str().unwrap().to_string();

    app.provider.push_response(feedback_json());
    let response = app
        .post(
            &format!("/assignments/{}/submissions", quiz_id),
            json!({"answers": {"q1": "a", "q2": "Yes", "q3": "The Denominator."}}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["submission"]["score"], 100.0);
    assert_eq!(result["submission"]["earned_points"], 4);
    assert_eq!(result["submission"]["feedback"]["summary"], "Strong work on fractions.");
    assert_eq!(result["next_difficulty"], "hard");
    assert_eq!(result["feedback_generated"], true);

    let revealed: Value = app
        .get(&format!("/assignments/{}", quiz_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(revealed["answers_revealed"], true);
    assert_eq!(revealed["questions"][1]["answer"], "true");

    let progress: Value = app.get("/progress").await.json().await.unwrap();
    assert_eq!(progress["total_attempts"], 1);
    assert_eq!(progress["subjects"][0]["recommended_difficulty"], "hard");

    app.provider.push_response(quiz_json());
    let next: Value = app
        .post("/quizzes", json!({"subject": "math", "topic": "Decimals"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(next["difficulty"], "hard");
}

async fn submit_quiz(app: &TestApp, subject: &str, answers: Value) {
    app.provider.push_response(quiz_json());
    let quiz: Value = app
        .post("/quizzes", json!({"subject": subject, "topic": "Fractions"}))
        .await
        .json()
        .await
        .unwrap();

    app.provider.push_response(feedback_json());
    let response = app
        .post(
            &format!("/assignments/{}/submissions", quiz["assignment_id"].as_str().unwrap()),
            json!({ "answers": answers }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn progress_treats_subject_case_as_one_subject() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    submit_quiz(&app, "Math", json!({"q1": "a", "q2": "true", "q3": "denominator"})).await;
    submit_quiz(&app, "math", json!({"q1": "c", "q2": "false", "q3": "numerator"})).await;

    let progress: Value = app.get("/progress").await.json().await.unwrap();
    assert_eq!(progress["total_attempts"], 2);
    let subjects = progress["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["subject"], "math");
    assert_eq!(subjects[0]["attempts"], 2);
    assert_eq!(subjects[0]["average_score"], 50.0);
    assert_eq!(subjects[0]["recommended_difficulty"], "medium");
}

#[tokio::test]
async fn submission_feedback_falls_back_when_the_model_fails() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    app.provider.push_response(quiz_json());
    let quiz: Value = app
        .post("/assignments", json!({"subject": "Math", "topic": "Fractions", "difficulty": "easy"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(quiz["difficulty"], "easy");
    let quiz_id = quiz["assignment_id"].as_str().unwrap().to_string();

    app.provider.push_error(ProviderError::ContentFiltered);
    let response = app
        .post(
            &format!("/assignments/{}/submissions", quiz_id),
            json!({"answers": {"q1": "B"}}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["submission"]["score"], 0.0);
    assert_eq!(result["feedback_generated"], false);
    assert_eq!(result["next_difficulty"], "easy");

    let attempts: Value = app
        .get(&format!("/assignments/{}/submissions", quiz_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(attempts.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn progress_feedback_without_history_skips_the_model() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app.post("/feedback", json!({})).await;
    assert_eq!(response.status().as_u16(), 201);
    let feedback: Value = response.json().await.unwrap();
    assert_eq!(feedback["generated"], false);
    assert!(app.provider.prompts().is_empty());

    let listed: Value = app.get("/feedback").await.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_assignment_kind_filter_is_a_bad_request() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app.get("/assignments?kind=essay").await;
    assert_eq!(response.status().as_u16(), 400);
}
