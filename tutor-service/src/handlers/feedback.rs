use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::agents::{feedback as feedback_agent, AgentKind, AgentOutput};
use crate::auth::AuthStudent;
use crate::dtos::{parse_optional_body, FeedbackResponse, ListQuery, RequestFeedbackRequest};
use crate::models::CreateFeedback;
use crate::services::parsing::clean_text;
use crate::AppState;

use super::record_usage;

/// How many recent submissions the progress review looks at.
const RECENT_SUBMISSIONS: i64 = 10;

/// Progress review across recent work. Without any graded work there is
/// nothing to review, so the stock "get started" feedback is stored without
/// calling the model.
pub async fn request_feedback(
    State(state): State<AppState>,
    student: AuthStudent,
    body: Bytes,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    let req: RequestFeedbackRequest = parse_optional_body(&body)?;
    req.validate()?;

    let subject = req
        .subject
        .as_deref()
        .map(clean_text)
        .filter(|s| !s.is_empty());
    let matches_subject =
        |s: &str| subject.as_deref().map_or(true, |want| s.eq_ignore_ascii_case(want));

    let progress: Vec<_> = state
        .db
        .subject_progress(student.id())
        .await?
        .into_iter()
        .filter(|p| matches_subject(&p.subject))
        .collect();

    let output = if progress.is_empty() {
        AgentOutput::fallback(feedback_agent::fallback_for_progress(&progress))
    } else {
        let recent: Vec<(String, f64)> = state
            .db
            .list_submissions(student.id(), None, subject.as_deref(), RECENT_SUBMISSIONS)
            .await?
            .into_iter()
            .map(|s| {
                (
                    format!("{} attempt on {}", s.subject, s.created_utc.format("%Y-%m-%d")),
                    s.score,
                )
            })
            .collect();

        let profile = state.db.get_student(student.id()).await?;
        let prompt = feedback_agent::build_progress_prompt(profile.as_ref(), &progress, &recent);
        let completion = state
            .llm
            .complete(AgentKind::Feedback, &prompt, feedback_agent::params())
            .await?;
        record_usage(&state, &completion, student.id(), None).await;

        feedback_agent::finalize(&completion.text, || {
            feedback_agent::fallback_for_progress(&progress)
        })
    };

    let stored = state
        .db
        .create_feedback(&CreateFeedback {
            student_id: student.id(),
            subject,
            content: output.value,
            generated: output.generated,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(stored.into())))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    student: AuthStudent,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FeedbackResponse>>, AppError> {
    query.validate()?;
    let feedback = state
        .db
        .list_feedback(student.id(), query.limit(), query.offset())
        .await?;
    Ok(Json(feedback.into_iter().map(FeedbackResponse::from).collect()))
}
