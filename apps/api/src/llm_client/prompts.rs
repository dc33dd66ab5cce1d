// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Common instruction appended to every prompt that embeds candidate data.
pub const GROUNDING_INSTRUCTION: &str = "\
    Only provide information that is present in the resume content above. \
    Do NOT infer, interpolate, or invent details such as dates, employers, \
    salaries, or skills that are not listed.";

/// Keeps the assistant on its single subject.
pub const SCOPE_INSTRUCTION: &str = "\
    Stay on topic: you only discuss the candidate's professional background, \
    experience, education, skills, certifications, and suitability for roles. \
    Politely decline unrelated requests.";
