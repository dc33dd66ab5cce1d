// Prompt constants for the career assistant.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, SCOPE_INSTRUCTION};
use crate::models::resume::ResumeContext;

/// System prompt template. Replace every `{placeholder}` before use.
pub const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a highly professional career assistant for {name}, {title}.

Your goal is to answer questions from recruiters or hiring managers about {name}'s professional background, work experience, technical skills, education, and certifications.

RESUME CONTENT:
{resume_json}

KEY STRENGTHS TO HIGHLIGHT:
{key_strengths}

GUIDELINES:
1. Be professional, technical, and helpful.
2. {scope_instruction}
3. {grounding_instruction}
4. If asked about performance, mention the academic honors listed under education.
5. If a question is not covered by the resume, politely guide them to contact {name} at {email}."#;

const NO_KEY_STRENGTHS: &str = "- Draw on whatever in the resume best answers the question.";

/// Builds the system prompt for one session. Called exactly once per session.
pub fn build_system_prompt(resume: &ResumeContext) -> Result<String, serde_json::Error> {
    let resume_json = serde_json::to_string_pretty(resume)?;

    let key_strengths = if resume.key_strengths.is_empty() {
        NO_KEY_STRENGTHS.to_string()
    } else {
        resume
            .key_strengths
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(render_template(
        SYSTEM_PROMPT_TEMPLATE,
        &[
            ("scope_instruction", SCOPE_INSTRUCTION),
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("key_strengths", key_strengths.as_str()),
            ("name", resume.name.as_str()),
            ("title", resume.title.as_str()),
            ("email", resume.contact_email()),
            ("resume_json", resume_json.as_str()),
        ],
    ))
}

/// Fills `{placeholder}`s in one pass over the template. Substituted values are
/// never rescanned, so braces inside résumé text come through untouched.
fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
