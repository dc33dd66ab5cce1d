//! Session Manager — one conversational session per process.
//!
//! Lifecycle: `SessionManager::new(provider)` in `main` → `start(resume)` once →
//! `send(text)` per user turn. The manager is shared through `AppState` as an
//! `Arc`; there is no global instance.
//!
//! Exchange-path failures never reach the caller as errors: provider failures
//! and empty payloads become fixed reply strings, and the cause is logged.
//! Only `start` failures (and sending before `start`) are typed errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::assistant::prompts::build_system_prompt;
use crate::llm_client::{ChatProvider, ChatSession, GenerationParams, LlmError, MODEL};
use crate::models::chat::ChatMessage;
use crate::models::resume::ResumeContext;
use crate::resume::validation::ResumeValidationError;

/// Returned when the provider answers with no usable text.
pub const EMPTY_REPLY_FALLBACK: &str = "I'm sorry, I couldn't process that request.";
/// Returned when the provider call fails for any reason.
pub const PROVIDER_FAILURE_REPLY: &str =
    "An error occurred while communicating with the AI assistant.";
/// Sampling temperature for every assistant session.
pub const ASSISTANT_TEMPERATURE: f32 = 0.7;
/// Transcript messages kept for display; the oldest are dropped first.
pub const MAX_TRANSCRIPT_MESSAGES: usize = 200;

/// Whether `text` is one of the fixed strings `send` substitutes for model output.
pub fn is_fallback_reply(text: &str) -> bool {
    text == EMPTY_REPLY_FALLBACK || text == PROVIDER_FAILURE_REPLY
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("resume context is malformed: {0}")]
    MalformedContext(#[from] ResumeValidationError),

    #[error("resume context could not be encoded: {0}")]
    ContextEncoding(#[from] serde_json::Error),

    #[error("provider credential is missing")]
    MissingCredential,

    #[error("provider rejected the credential (status {0})")]
    CredentialRejected(u16),

    #[error("provider unreachable: {0}")]
    ProviderUnreachable(LlmError),

    #[error("assistant session is already started")]
    AlreadyStarted,
}

impl From<LlmError> for InitError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => InitError::MissingCredential,
            LlmError::Unauthorized { status } => InitError::CredentialRejected(status),
            other => InitError::ProviderUnreachable(other),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    #[error("assistant session has not been started")]
    NotInitialized,
}

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReplyOutcome {
    Answered,
    Empty,
    ProviderFailure { transient: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub active: bool,
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    /// Messages in the transcript (two per exchange).
    pub messages: usize,
    pub prompt_chars: Option<usize>,
    pub model: &'static str,
}

#[derive(Debug)]
struct SessionInfo {
    id: Uuid,
    started_at: DateTime<Utc>,
    system_prompt: String,
}

pub struct SessionManager {
    provider: Arc<dyn ChatProvider>,
    /// The provider session. Held across the whole provider call, so
    /// concurrent sends queue here instead of interleaving.
    session: Mutex<Option<Box<dyn ChatSession>>>,
    info: OnceCell<SessionInfo>,
    transcript: RwLock<Vec<ChatMessage>>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            session: Mutex::new(None),
            info: OnceCell::new(),
            transcript: RwLock::new(Vec::new()),
        }
    }

    /// Builds the system prompt from `resume` and opens the provider session.
    /// Succeeds at most once per manager.
    pub async fn start(&self, resume: &ResumeContext) -> Result<(), InitError> {
        let mut slot = self.session.lock().await;
        if slot.is_some() {
            return Err(InitError::AlreadyStarted);
        }

        resume.validate()?;
        let system_prompt = build_system_prompt(resume)?;

        let params = GenerationParams {
            temperature: ASSISTANT_TEMPERATURE,
        };
        let provider_session = self.provider.open_session(&system_prompt, params).await?;

        let info = SessionInfo {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            system_prompt,
        };
        info!(
            session_id = %info.id,
            prompt_chars = info.system_prompt.len(),
            "Assistant session started for {}",
            resume.name
        );
        // The slot was empty under the lock, so the cell is unset too.
        if self.info.set(info).is_err() {
            return Err(InitError::AlreadyStarted);
        }
        *slot = Some(provider_session);

        Ok(())
    }

    /// Sends one user turn and returns the text to show the user.
    pub async fn send(&self, user_text: &str) -> Result<String, SendError> {
        self.send_detailed(user_text).await.map(|reply| reply.text)
    }

    /// Like `send`, but also reports whether the text is a fallback.
    pub async fn send_detailed(&self, user_text: &str) -> Result<Reply, SendError> {
        let mut slot = self.session.lock().await;
        let session = slot.as_mut().ok_or(SendError::NotInitialized)?;
        let session_id = self.info.get().map(|i| i.id);

        let reply = match session.send(user_text).await {
            Ok(text) if text.is_empty() => {
                warn!(session_id = ?session_id, "Provider returned an empty reply");
                Reply {
                    text: EMPTY_REPLY_FALLBACK.to_string(),
                    outcome: ReplyOutcome::Empty,
                }
            }
            Ok(text) => Reply {
                text,
                outcome: ReplyOutcome::Answered,
            },
            Err(e) => {
                let transient = e.is_transient();
                error!(
                    session_id = ?session_id,
                    transient,
                    error = %e,
                    "Gemini API error"
                );
                Reply {
                    text: PROVIDER_FAILURE_REPLY.to_string(),
                    outcome: ReplyOutcome::ProviderFailure { transient },
                }
            }
        };

        // Still under the session lock, so transcript order matches call order.
        let mut transcript = self.transcript.write().await;
        transcript.push(ChatMessage::user(user_text));
        transcript.push(ChatMessage::assistant(reply.text.clone()));
        if transcript.len() > MAX_TRANSCRIPT_MESSAGES {
            let excess = transcript.len() - MAX_TRANSCRIPT_MESSAGES;
            transcript.drain(..excess);
        }

        Ok(reply)
    }

    pub fn is_started(&self) -> bool {
        self.info.initialized()
    }

    /// The prompt this session is bound to, once started.
    pub fn system_prompt(&self) -> Option<&str> {
        self.info.get().map(|i| i.system_prompt.as_str())
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        let messages = self.transcript.read().await.len();
        let info = self.info.get();
        SessionStatus {
            active: info.is_some(),
            session_id: info.map(|i| i.id),
            started_at: info.map(|i| i.started_at),
            messages,
            prompt_chars: self.system_prompt().map(str::len),
            model: MODEL,
        }
    }
}
