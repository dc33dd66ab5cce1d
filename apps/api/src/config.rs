use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_BASE;

/// Application configuration loaded from environment variables.
///
/// The Gemini key is optional here: a missing key surfaces later as a failed
/// assistant start, and the résumé is still served.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub resume_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("gemini_api_base", &self.gemini_api_base)
            .field("resume_path", &self.resume_path)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY").or_else(|| optional_env("API_KEY")),
            gemini_api_base: optional_env("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            resume_path: optional_env("RESUME_PATH").map(PathBuf::from),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads `key`, treating unset and blank values alike.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
