use axum::{extract::State, Json};

use crate::models::resume::ResumeContext;
use crate::state::AppState;

/// GET /api/v1/resume
pub async fn handle_get_resume(State(state): State<AppState>) -> Json<ResumeContext> {
    Json(state.resume.as_ref().clone())
}
