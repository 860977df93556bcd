use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::agents::assignment::{self as assignment_agent, AssignmentBrief};
use crate::agents::{feedback as feedback_agent, AgentKind};
use crate::auth::AuthStudent;
use crate::dtos::{
    AssignmentSummary, AssignmentView, CreateAssignmentRequest, CreateQuizRequest, ListQuery,
    SubmissionResponse, SubmitAnswersRequest, DEFAULT_ASSIGNMENT_QUESTIONS,
    DEFAULT_QUIZ_QUESTIONS,
};
use crate::models::{
    Assignment, AssignmentKind, CreateAssignment, CreateSubmission, Difficulty, Lesson,
    Submission,
};
use crate::services::grading::{grade, recommend_difficulty, DIFFICULTY_WINDOW};
use crate::services::metrics::{SCORES, SUBMISSIONS_TOTAL};
use crate::services::parsing::clean_text;
use crate::AppState;

use super::record_usage;

const MAX_SUBMISSIONS_LISTED: i64 = 100;

fn subject_and_topic(subject: &str, topic: &str) -> Result<(String, String), AppError> {
    let subject = clean_text(subject);
    let topic = clean_text(topic);
    if subject.is_empty() || topic.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Subject and topic must not be blank"
        )));
    }
    Ok((subject, topic))
}

async fn load_lesson(
    state: &AppState,
    student_id: Uuid,
    lesson_id: Option<Uuid>,
) -> Result<Option<Lesson>, AppError> {
    let Some(lesson_id) = lesson_id else {
        return Ok(None);
    };
    let lesson = state
        .db
        .get_lesson(student_id, lesson_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Lesson {} not found", lesson_id)))?;
    Ok(Some(lesson))
}

async fn load_assignment(
    state: &AppState,
    student_id: Uuid,
    assignment_id: Uuid,
) -> Result<Assignment, AppError> {
    state
        .db
        .get_assignment(student_id, assignment_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Assignment {} not found", assignment_id))
        })
}

/// Prompt, parse, store. Shared by assignments and quizzes.
async fn generate_assignment(
    state: &AppState,
    student_id: Uuid,
    brief: AssignmentBrief,
    lesson: Option<Lesson>,
) -> Result<Assignment, AppError> {
    let lesson_content = lesson.as_ref().map(|l| &l.content.0);
    let prompt = assignment_agent::build_prompt(&brief, lesson_content);

    let completion = state
        .llm
        .complete(brief.agent(), &prompt, assignment_agent::params())
        .await?;
    let output = assignment_agent::finalize(&completion.text, &brief);

    let stored = state
        .db
        .create_assignment(&CreateAssignment {
            student_id,
            lesson_id: lesson.map(|l| l.lesson_id),
            kind: brief.kind,
            subject: brief.subject,
            topic: brief.topic,
            difficulty: brief.difficulty,
            title: output.value.title,
            instructions: output.value.instructions,
            questions: output.value.questions,
            generated: output.generated,
        })
        .await?;
    record_usage(state, &completion, student_id, None).await;

    Ok(stored)
}

pub async fn create_assignment(
    State(state): State<AppState>,
    student: AuthStudent,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<AssignmentView>), AppError> {
    req.validate()?;
    let (subject, topic) = subject_and_topic(&req.subject, &req.topic)?;
    let lesson = load_lesson(&state, student.id(), req.lesson_id).await?;

    let difficulty = req
        .difficulty
        .or_else(|| {
            lesson
                .as_ref()
                .map(|l| Difficulty::from_string(&l.difficulty))
        })
        .unwrap_or(Difficulty::Medium);

    let brief = AssignmentBrief {
        kind: AssignmentKind::Assignment,
        subject,
        topic,
        difficulty,
        question_count: req.question_count.unwrap_or(DEFAULT_ASSIGNMENT_QUESTIONS) as usize,
    };

    let assignment = generate_assignment(&state, student.id(), brief, lesson).await?;
    Ok((
        StatusCode::CREATED,
        Json(AssignmentView::new(&assignment, false)),
    ))
}

/// Quiz difficulty follows the student's recent scores in the subject.
pub async fn create_quiz(
    State(state): State<AppState>,
    student: AuthStudent,
    Json(req): Json<CreateQuizRequest>,
) -> Result<(StatusCode, Json<AssignmentView>), AppError> {
    req.validate()?;
    let (subject, topic) = subject_and_topic(&req.subject, &req.topic)?;
    let lesson = load_lesson(&state, student.id(), req.lesson_id).await?;

    let scores = state
        .db
        .recent_scores(student.id(), &subject, DIFFICULTY_WINDOW as i64)
        .await?;
    let difficulty = recommend_difficulty(&scores);

    tracing::info!(
        subject = %subject,
        history = scores.len(),
        difficulty = difficulty.as_str(),
        "Adaptive quiz difficulty selected"
    );

    let brief = AssignmentBrief {
        kind: AssignmentKind::Quiz,
        subject,
        topic,
        difficulty,
        question_count: req.question_count.unwrap_or(DEFAULT_QUIZ_QUESTIONS) as usize,
    };

    let quiz = generate_assignment(&state, student.id(), brief, lesson).await?;
    Ok((StatusCode::CREATED, Json(AssignmentView::new(&quiz, false))))
}

pub async fn list_assignments(
    State(state): State<AppState>,
    student: AuthStudent,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AssignmentSummary>>, AppError> {
    query.validate()?;

    let kind = match query.kind.as_deref() {
        None => None,
        Some(k @ ("assignment" | "quiz")) => Some(k),
        Some(other) => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "kind must be 'assignment' or 'quiz', got '{}'",
                other
            )))
        }
    };

    let assignments = state
        .db
        .list_assignments(
            student.id(),
            query.subject(),
            kind,
            query.limit(),
            query.offset(),
        )
        .await?;

    Ok(Json(
        assignments.iter().map(AssignmentSummary::from).collect(),
    ))
}

/// Answers stay hidden until the student has submitted at least once.
pub async fn get_assignment(
    State(state): State<AppState>,
    student: AuthStudent,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<AssignmentView>, AppError> {
    let assignment = load_assignment(&state, student.id(), assignment_id).await?;
    let attempted = !state
        .db
        .list_submissions(student.id(), Some(assignment_id), None, 1)
        .await?
        .is_empty();

    Ok(Json(AssignmentView::new(&assignment, attempted)))
}

/// Grade the answers, ask the feedback agent for commentary, store both.
/// A failed feedback call falls back to score-band feedback rather than
/// losing the graded attempt.
pub async fn submit_assignment(
    State(state): State<AppState>,
    student: AuthStudent,
    Path(assignment_id): Path<Uuid>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    req.validate()?;

    let assignment = load_assignment(&state, student.id(), assignment_id).await?;
    let graded = grade(&assignment.questions.0, &req.answers);

    let profile = state.db.get_student(student.id()).await?;
    let prompt = feedback_agent::build_submission_prompt(&assignment, &graded, profile.as_ref());
    let fallback = || feedback_agent::fallback_for_score(graded.score, &assignment.subject);

    let feedback = match state
        .llm
        .complete(AgentKind::Feedback, &prompt, feedback_agent::params())
        .await
    {
        Ok(completion) => {
            record_usage(&state, &completion, student.id(), None).await;
            feedback_agent::finalize(&completion.text, fallback)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Feedback model call failed, using score-band feedback");
            crate::agents::AgentOutput::fallback(fallback())
        }
    };

    let submission = state
        .db
        .create_submission(&CreateSubmission {
            assignment_id,
            student_id: student.id(),
            subject: assignment.subject.clone(),
            answers: req.answers,
            results: graded.results,
            earned_points: graded.earned_points,
            total_points: graded.total_points,
            score: graded.score,
            feedback: Some(feedback.value),
        })
        .await?;

    let kind = assignment.kind();
    SUBMISSIONS_TOTAL.with_label_values(&[kind.as_str()]).inc();
    SCORES
        .with_label_values(&[kind.as_str()])
        .observe(submission.score);

    let scores = state
        .db
        .recent_scores(student.id(), &assignment.subject, DIFFICULTY_WINDOW as i64)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            submission,
            next_difficulty: recommend_difficulty(&scores),
            feedback_generated: feedback.generated,
        }),
    ))
}

pub async fn list_submissions(
    State(state): State<AppState>,
    student: AuthStudent,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, AppError> {
    load_assignment(&state, student.id(), assignment_id).await?;
    let submissions = state
        .db
        .list_submissions(student.id(), Some(assignment_id), None, MAX_SUBMISSIONS_LISTED)
        .await?;
    Ok(Json(submissions))
}
