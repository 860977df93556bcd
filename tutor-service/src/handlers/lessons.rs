use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::agents::{lesson, AgentKind};
use crate::auth::AuthStudent;
use crate::dtos::{CreateLessonRequest, LessonResponse, ListQuery};
use crate::models::CreateLesson;
use crate::services::grading::{recommend_difficulty, DIFFICULTY_WINDOW};
use crate::services::parsing::clean_text;
use crate::AppState;

use super::record_usage;

pub async fn create_lesson(
    State(state): State<AppState>,
    student: AuthStudent,
    Json(req): Json<CreateLessonRequest>,
) -> Result<(StatusCode, Json<LessonResponse>), AppError> {
    req.validate()?;

    let subject = clean_text(&req.subject);
    let topic = clean_text(&req.topic);
    if subject.is_empty() || topic.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Subject and topic must not be blank"
        )));
    }

    let difficulty = match req.difficulty {
        Some(d) => d,
        None => {
            let scores = state
                .db
                .recent_scores(student.id(), &subject, DIFFICULTY_WINDOW as i64)
                .await?;
            recommend_difficulty(&scores)
        }
    };

    let brief = lesson::LessonBrief {
        subject,
        topic,
        difficulty,
        focus: req.focus,
    };

    let profile = state.db.get_student(student.id()).await?;
    let prompt = lesson::build_prompt(&brief, profile.as_ref());
    let completion = state
        .llm
        .complete(AgentKind::Lesson, &prompt, lesson::params())
        .await?;
    let output = lesson::finalize(&completion.text, &brief);

    let stored = state
        .db
        .create_lesson(&CreateLesson {
            student_id: student.id(),
            subject: brief.subject,
            topic: brief.topic,
            difficulty: difficulty.as_str().to_string(),
            content: output.value,
            generated: output.generated,
        })
        .await?;
    record_usage(&state, &completion, student.id(), None).await;

    Ok((StatusCode::CREATED, Json(stored.into())))
}

pub async fn list_lessons(
    State(state): State<AppState>,
    student: AuthStudent,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LessonResponse>>, AppError> {
    query.validate()?;
    let lessons = state
        .db
        .list_lessons(student.id(), query.subject(), query.limit(), query.offset())
        .await?;
    Ok(Json(lessons.into_iter().map(LessonResponse::from).collect()))
}

pub async fn get_lesson(
    State(state): State<AppState>,
    student: AuthStudent,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<LessonResponse>, AppError> {
    let lesson = state
        .db
        .get_lesson(student.id(), lesson_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Lesson {} not found", lesson_id)))?;
    Ok(Json(lesson.into()))
}
