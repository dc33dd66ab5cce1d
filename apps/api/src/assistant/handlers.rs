use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::assistant::session::{is_fallback_reply, SessionStatus};
use crate::errors::AppError;
use crate::models::chat::ChatMessage;
use crate::resume::loader::SUGGESTED_QUESTIONS;
use crate::state::AppState;

/// Longest user message accepted, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub reply: String,
    /// Set when `reply` is a fallback string rather than model output.
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct AssistantInfoResponse {
    pub available: bool,
    pub greeting: String,
    pub suggestions: Vec<&'static str>,
    pub session: SessionStatus,
}

/// GET /api/v1/assistant
pub async fn handle_assistant_info(State(state): State<AppState>) -> Json<AssistantInfoResponse> {
    Json(AssistantInfoResponse {
        available: state.assistant.is_started(),
        greeting: state.resume.greeting(),
        suggestions: SUGGESTED_QUESTIONS.to_vec(),
        session: state.assistant.status().await,
    })
}

/// POST /api/v1/assistant/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let reply = state.assistant.send(message).await?;
    Ok(Json(SendMessageResponse {
        degraded: is_fallback_reply(&reply),
        reply,
    }))
}

/// GET /api/v1/assistant/transcript
pub async fn handle_transcript(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.assistant.transcript().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::assistant::session::{SessionManager, PROVIDER_FAILURE_REPLY};
    use crate::llm_client::{ChatProvider, ChatSession, GenerationParams, LlmError};
    use crate::resume::loader::bundled_resume;
    use crate::routes::build_router;
    use crate::state::AppState;

    struct CannedProvider {
        fail: bool,
    }

    struct CannedSession {
        fail: bool,
    }

    #[async_trait]
    impl ChatProvider for CannedProvider {
        async fn open_session(
            &self,
            _system_prompt: &str,
            _params: GenerationParams,
        ) -> Result<Box<dyn ChatSession>, LlmError> {
            Ok(Box::new(CannedSession { fail: self.fail }))
        }
    }

    #[async_trait]
    impl ChatSession for CannedSession {
        async fn send(&mut self, text: &str) -> Result<String, LlmError> {
            if self.fail {
                return Err(LlmError::RateLimited);
            }
            Ok(format!("You asked: {text}"))
        }
    }

    async fn app(started: bool, fail: bool) -> Router {
        let resume = bundled_resume().unwrap();
        let assistant = SessionManager::new(Arc::new(CannedProvider { fail }));
        if started {
            assistant.start(&resume).await.unwrap();
        }
        build_router(AppState {
            resume: Arc::new(resume),
            assistant: Arc::new(assistant),
        })
    }

    fn post_message(message: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/assistant/messages")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "message": message }).to_string(),
            ))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_send_message_returns_reply() {
        let response = app(true, false)
            .await
            .oneshot(post_message("  Where did they graduate? "))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["reply"], "You asked: Where did they graduate?");
        assert_eq!(body["degraded"], false);
    }

    #[tokio::test]
    async fn test_provider_failure_is_200_with_apology() {
        let response = app(true, true)
            .await
            .oneshot(post_message("hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["reply"], PROVIDER_FAILURE_REPLY);
        assert_eq!(body["degraded"], true);
    }

    #[tokio::test]
    async fn test_unstarted_assistant_is_503() {
        let response = app(false, false)
            .await
            .oneshot(post_message("hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "ASSISTANT_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let response = app(true, false)
            .await
            .oneshot(post_message("   "))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_oversized_message_is_rejected() {
        let long = "a".repeat(super::MAX_MESSAGE_CHARS + 1);
        let response = app(true, false)
            .await
            .oneshot(post_message(&long))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_assistant_info_reports_availability() {
        let response = app(false, false)
            .await
            .oneshot(
                Request::builder()
                    .uri("/api/v1/assistant")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["available"], false);
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 4);
        assert!(body["greeting"]
            .as_str()
            .unwrap()
            .contains("ROSTOM A. SIERVO"));
    }

    #[tokio::test]
    async fn test_transcript_lists_exchanges() {
        let app = app(true, false).await;
        app.clone().oneshot(post_message("hi")).await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/assistant/transcript")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(
            body,
            serde_json::json!([
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "You asked: hi" }
            ])
        );
    }

    #[tokio::test]
    async fn test_resume_and_health_routes() {
        let app = app(false, false).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/resume")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["name"], "ROSTOM A. SIERVO");
        assert_eq!(body["education"][0]["degree"], "BS Information Technology - Cum Laude");

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
    }
}
