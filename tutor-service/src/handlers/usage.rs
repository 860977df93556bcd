use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::auth::AuthStudent;
use crate::models::UsageStats;
use crate::AppState;

pub async fn get_usage(
    State(state): State<AppState>,
    student: AuthStudent,
) -> Result<Json<UsageStats>, AppError> {
    let records = state.db.usage_for_student(student.id()).await?;
    Ok(Json(UsageStats::from_records(&records)))
}
