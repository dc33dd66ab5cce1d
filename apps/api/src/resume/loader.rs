use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::resume::ResumeContext;

/// The résumé shipped with the binary, used when `RESUME_PATH` is not set.
const BUNDLED_RESUME: &str = include_str!("../../data/resume.json");

impl ResumeContext {
    /// Opening line shown above an empty transcript.
    pub fn greeting(&self) -> String {
        format!(
            "Hi there! I'm the career assistant for {}. Feel free to ask me anything about their experience, skills, or specific projects!",
            self.name
        )
    }
}

/// Starter questions offered while the transcript is still short.
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "Tell me about their tech stack",
    "What are their key achievements?",
    "Do they have experience with OCI?",
    "Where did they graduate?",
];

pub fn bundled_resume() -> Result<ResumeContext> {
    serde_json::from_str(BUNDLED_RESUME).context("Bundled resume.json is not a valid resume")
}

/// Loads the résumé from `path`, or the bundled one when no path is given.
pub fn load_resume(path: Option<&Path>) -> Result<ResumeContext> {
    let Some(path) = path else {
        info!("Using bundled resume");
        return bundled_resume();
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resume file '{}'", path.display()))?;
    let resume: ResumeContext = serde_json::from_str(&raw)
        .with_context(|| format!("Resume file '{}' is not valid resume JSON", path.display()))?;

    info!("Loaded resume for {} from {}", resume.name, path.display());
    Ok(resume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_resume_parses() {
        let resume = bundled_resume().unwrap();
        assert_eq!(resume.name, "ROSTOM A. SIERVO");
        assert_eq!(resume.experiences.len(), 3);
        assert_eq!(resume.certifications.len(), 5);
        assert!(resume.projects.is_empty());
        assert_eq!(resume.key_strengths.len(), 4);
    }

    #[test]
    fn test_load_resume_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"name": "Ada Lovelace", "title": "Analyst", "email": "ada@example.org"}}"#
        )
        .unwrap();

        let resume = load_resume(Some(file.path())).unwrap();
        assert_eq!(resume.name, "Ada Lovelace");
        assert!(resume.experiences.is_empty());
        assert!(resume.key_strengths.is_empty());
    }

    #[test]
    fn test_load_resume_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_resume(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read resume file"));
    }

    #[test]
    fn test_load_resume_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"title": "No name"}}"#).unwrap();
        assert!(load_resume(Some(file.path())).is_err());
    }

    #[test]
    fn test_greeting_names_candidate() {
        let resume = bundled_resume().unwrap();
        assert!(resume.greeting().starts_with("Hi there! I'm the career assistant for ROSTOM A. SIERVO."));
    }
}
