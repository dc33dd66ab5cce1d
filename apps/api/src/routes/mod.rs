pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assistant::handlers;
use crate::resume::handlers::handle_get_resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resume", get(handle_get_resume))
        .route("/api/v1/assistant", get(handlers::handle_assistant_info))
        .route(
            "/api/v1/assistant/messages",
            post(handlers::handle_send_message),
        )
        .route(
            "/api/v1/assistant/transcript",
            get(handlers::handle_transcript),
        )
        .with_state(state)
}
