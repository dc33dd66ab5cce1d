use std::sync::Arc;

use crate::assistant::session::SessionManager;
use crate::models::resume::ResumeContext;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The résumé the process was started with. Immutable.
    pub resume: Arc<ResumeContext>,
    /// The single assistant session for this process. May be unstarted if
    /// initialisation failed; handlers then report the assistant as unavailable.
    pub assistant: Arc<SessionManager>,
}
