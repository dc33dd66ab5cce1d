// Career assistant: the conversational session wrapper around the Gemini provider.
// All provider calls go through llm_client; this module owns the session lifecycle.

pub mod handlers;
pub mod prompts;
pub mod session;
