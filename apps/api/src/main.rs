mod assistant;
mod config;
mod errors;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::session::SessionManager;
use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::resume::loader::load_resume;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career Assistant API v{}", env!("CARGO_PKG_VERSION"));

    // Load the résumé (bundled unless RESUME_PATH is set)
    let resume = load_resume(config.resume_path.as_deref())?;

    // Initialize LLM client
    let llm = GeminiClient::new(
        config.gemini_api_key.clone().unwrap_or_default(),
        config.gemini_api_base.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Start the single assistant session. A failure disables chat only;
    // the résumé is still served.
    let assistant = SessionManager::new(Arc::new(llm));
    match assistant.start(&resume).await {
        Ok(()) => info!("Career assistant ready"),
        Err(e) => error!("Career assistant unavailable: {e}"),
    }

    let state = AppState {
        resume: Arc::new(resume),
        assistant: Arc::new(assistant),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
