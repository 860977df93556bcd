use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::auth::AuthStudent;
use crate::dtos::{ProgressResponse, SubjectProgressView};
use crate::services::grading::recommend_difficulty;
use crate::AppState;

pub async fn get_progress(
    State(state): State<AppState>,
    student: AuthStudent,
) -> Result<Json<ProgressResponse>, AppError> {
    let progress = state.db.subject_progress(student.id()).await?;

    let subjects: Vec<SubjectProgressView> = progress
        .into_iter()
        .map(|p| SubjectProgressView {
            recommended_difficulty: recommend_difficulty(&p.recent_scores),
            progress: p,
        })
        .collect();

    let total_attempts: i64 = subjects.iter().map(|s| s.progress.attempts).sum();
    let weighted: f64 = subjects
        .iter()
        .map(|s| s.progress.average_score * s.progress.attempts as f64)
        .sum();
    let overall_average = if total_attempts > 0 {
        (weighted / total_attempts as f64 * 100.0).round() / 100.0
    } else {
        0.0
    };

    Ok(Json(ProgressResponse {
        total_attempts,
        overall_average,
        subjects,
    }))
}
