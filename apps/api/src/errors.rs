use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::assistant::session::SendError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Assistant unavailable")]
    AssistantUnavailable,
}

impl From<SendError> for AppError {
    fn from(e: SendError) -> Self {
        match e {
            SendError::NotInitialized => AppError::AssistantUnavailable,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::AssistantUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ASSISTANT_UNAVAILABLE",
                "The career assistant is currently unavailable".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
