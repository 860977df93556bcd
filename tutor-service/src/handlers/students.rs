use axum::{extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::auth::AuthStudent;
use crate::dtos::UpdateProfileRequest;
use crate::models::{Student, UpsertStudent};
use crate::services::parsing::{clean_list, clean_text};
use crate::AppState;

pub async fn get_me(
    State(state): State<AppState>,
    student: AuthStudent,
) -> Result<Json<Student>, AppError> {
    let profile = state
        .db
        .get_student(student.id())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not created yet")))?;

    Ok(Json(profile))
}

pub async fn update_me(
    State(state): State<AppState>,
    student: AuthStudent,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Student>, AppError> {
    req.validate()?;

    let display_name = clean_text(&req.display_name);
    if display_name.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Display name must not be blank"
        )));
    }

    let input = UpsertStudent {
        student_id: student.id(),
        display_name,
        grade_level: req.grade_level.as_deref().map(clean_text).filter(|s| !s.is_empty()),
        learning_goals: req
            .learning_goals
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        interests: clean_list(&req.interests),
    };

    let profile = state.db.upsert_student(&input).await?;

    tracing::info!(student_id = %profile.student_id, "Profile saved");

    Ok(Json(profile))
}
