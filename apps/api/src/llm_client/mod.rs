/// LLM Client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Generative Language API directly.
/// All LLM interactions MUST go through this module.
///
/// Model: gemini-3-flash-preview (hardcoded — do not make configurable to prevent drift)
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;

/// Public Generative Language API endpoint. Overridable via `GEMINI_API_BASE`.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The model used for every assistant session.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-3-flash-preview";
/// Complete exchanges a session replays on each request. Older exchanges are
/// dropped so a long-lived session stays under the model's context window.
pub const MAX_HISTORY_EXCHANGES: usize = 20;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is missing")]
    MissingApiKey,

    #[error("API key was rejected (status {status})")]
    Unauthorized { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited")]
    RateLimited,
}

impl LlmError {
    /// Whether re-asking later could plausibly succeed.
    /// Used to tag operator logs; nothing retries automatically.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::RateLimited => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::MissingApiKey | LlmError::Unauthorized { .. } | LlmError::Parse(_) => false,
        }
    }
}

/// Sampling parameters fixed at session creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
}

/// Creates provider sessions bound to a system prompt.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn open_session(
        &self,
        system_prompt: &str,
        params: GenerationParams,
    ) -> Result<Box<dyn ChatSession>, LlmError>;
}

/// One bound conversation. Implementations own the conversation history;
/// callers only ever pass the next user turn.
#[async_trait]
pub trait ChatSession: Send {
    /// Sends one user turn and returns the generated text ("" when the
    /// provider produced no usable text).
    async fn send(&mut self, text: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: &'a Content,
    contents: &'a [Content],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    details: Vec<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Wraps the Generative Language API. Cheap to clone.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, MODEL)
    }

    /// Confirms the endpoint is reachable and the key is accepted for `MODEL`.
    async fn verify(&self) -> Result<(), LlmError> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, body));
        }
        Ok(())
    }

    /// Makes a single generateContent call. No retries: a failure goes straight
    /// back to the caller.
    pub async fn generate(
        &self,
        system_instruction: &Content,
        contents: &[Content],
        params: GenerationParams,
    ) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                temperature: params.temperature,
            },
        };

        debug!(model = MODEL, turns = contents.len(), "Gemini API request");

        let response = self
            .client
            .post(format!("{}:generateContent", self.model_url()))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini API rate limited the request");
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, body));
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, candidates_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(parsed)
    }
}

/// Maps a non-success response to an `LlmError`.
///
/// Gemini reports a bad key as 400 INVALID_ARGUMENT with reason
/// `API_KEY_INVALID`, not as 401/403, so the body decides.
fn error_from_response(status: StatusCode, body: String) -> LlmError {
    let parsed = serde_json::from_str::<GeminiError>(&body).ok();
    let key_invalid = parsed.as_ref().is_some_and(|e| {
        e.error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN || key_invalid {
        return LlmError::Unauthorized {
            status: status.as_u16(),
        };
    }

    LlmError::Api {
        status: status.as_u16(),
        message: parsed.map(|e| e.error.message).unwrap_or(body),
    }
}

#[async_trait]
impl ChatProvider for GeminiClient {
    async fn open_session(
        &self,
        system_prompt: &str,
        params: GenerationParams,
    ) -> Result<Box<dyn ChatSession>, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        self.verify().await?;
        info!("Gemini session opened (model: {MODEL})");

        Ok(Box::new(GeminiChat {
            client: Arc::new(self.clone()),
            system_instruction: Content::text(None, system_prompt),
            params,
            history: Vec::new(),
        }))
    }
}

/// Client-side chat state: the REST API is stateless, so every request replays
/// the committed history.
pub struct GeminiChat {
    client: Arc<GeminiClient>,
    system_instruction: Content,
    params: GenerationParams,
    history: Vec<Content>,
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send(&mut self, text: &str) -> Result<String, LlmError> {
        let user_turn = Content::text(Some("user"), text);
        let mut contents = self.history.clone();
        contents.push(user_turn.clone());

        let response = self
            .client
            .generate(&self.system_instruction, &contents, self.params)
            .await?;
        let reply = response.text();

        // Only complete exchanges become history.
        if !reply.is_empty() {
            self.history.push(user_turn);
            self.history.push(Content::text(Some("model"), &reply));
            let max_len = MAX_HISTORY_EXCHANGES * 2;
            if self.history.len() > max_len {
                let excess = self.history.len() - max_len;
                self.history.drain(..excess);
            }
        }

        Ok(reply)
    }
}
