pub mod assignments;
pub mod feedback;
pub mod health;
pub mod lessons;
pub mod progress;
pub mod sessions;
pub mod students;
pub mod usage;

use crate::services::Completion;
use crate::AppState;
use uuid::Uuid;

/// Persist token usage for a model call. Failures are logged, not returned:
/// the student already has their answer.
pub(crate) async fn record_usage(
    state: &AppState,
    completion: &Completion,
    student_id: Uuid,
    session_id: Option<Uuid>,
) {
    let record = completion.usage(student_id, session_id);
    if let Err(e) = state.db.record_usage(&record).await {
        tracing::error!(error = %e, agent = %record.agent, "Failed to record model usage");
    }
}
