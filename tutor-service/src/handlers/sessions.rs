use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::agents::{tutor, AgentKind};
use crate::auth::AuthStudent;
use crate::dtos::{
    ChatTurnResponse, CreateSessionRequest, ListQuery, SendMessageRequest, SessionDetailResponse,
};
use crate::models::{CreateSession, TutorSession};
use crate::services::parsing::clean_text;
use crate::AppState;

/// Upper bound on messages returned with a session.
const MAX_TRANSCRIPT_MESSAGES: i64 = 500;

pub async fn create_session(
    State(state): State<AppState>,
    student: AuthStudent,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<TutorSession>), AppError> {
    req.validate()?;

    let subject = clean_text(&req.subject);
    if subject.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Subject must not be blank")));
    }
    let topic = req.topic.as_deref().map(clean_text).filter(|t| !t.is_empty());

    let profile = state.db.get_student(student.id()).await?;
    let system_prompt = tutor::system_prompt(profile.as_ref(), &subject, topic.as_deref());
    let title = req
        .title
        .as_deref()
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| tutor::default_title(&subject, topic.as_deref()));

    let session = state
        .db
        .create_session(&CreateSession {
            student_id: student.id(),
            title,
            subject,
            topic,
            system_prompt,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    student: AuthStudent,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TutorSession>>, AppError> {
    query.validate()?;
    let sessions = state
        .db
        .list_sessions(student.id(), query.limit(), query.offset())
        .await?;
    Ok(Json(sessions))
}

async fn load_session(
    state: &AppState,
    student_id: Uuid,
    session_id: Uuid,
) -> Result<TutorSession, AppError> {
    state
        .db
        .get_session(student_id, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session {} not found", session_id)))
}

pub async fn get_session(
    State(state): State<AppState>,
    student: AuthStudent,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDetailResponse>, AppError> {
    let session = load_session(&state, student.id(), session_id).await?;
    let messages = state
        .db
        .recent_messages(session_id, MAX_TRANSCRIPT_MESSAGES)
        .await?;

    Ok(Json(SessionDetailResponse { session, messages }))
}

pub async fn delete_session(
    State(state): State<AppState>,
    student: AuthStudent,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.db.delete_session(student.id(), session_id).await? {
        tracing::info!(session_id = %session_id, "Tutor session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!(
            "Session {} not found",
            session_id
        )))
    }
}

/// One chat turn. Nothing is stored unless the model answers.
pub async fn send_message(
    State(state): State<AppState>,
    student: AuthStudent,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ChatTurnResponse>, AppError> {
    req.validate()?;

    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Message must not be blank")));
    }

    let session = load_session(&state, student.id(), session_id).await?;
    let history = state
        .db
        .recent_messages(session_id, state.config.tutor.chat_history_limit)
        .await?;

    let prompt = tutor::build_chat_prompt(&history, content);
    let completion = state
        .llm
        .complete(AgentKind::Tutor, &prompt, tutor::params(&session.system_prompt))
        .await?;
    let reply = tutor::finalize_reply(&completion.text);

    let usage = completion.usage(student.id(), Some(session_id));
    let (user_message, reply_message) = state
        .db
        .add_turn(session_id, content, &reply.value, &usage)
        .await?;

    Ok(Json(ChatTurnResponse {
        user_message,
        reply: reply_message,
        generated: reply.generated,
    }))
}
