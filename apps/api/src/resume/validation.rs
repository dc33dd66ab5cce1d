use thiserror::Error;

use crate::models::resume::ResumeContext;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResumeValidationError {
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),

    #[error("'{0}' is not a valid contact email")]
    InvalidEmail(String),
}

impl ResumeContext {
    /// Checks the fields the assistant depends on.
    ///
    /// The name anchors the persona and the email is where out-of-scope questions
    /// are redirected, so both must be present. Everything else may be empty.
    pub fn validate(&self) -> Result<(), ResumeValidationError> {
        if self.name.trim().is_empty() {
            return Err(ResumeValidationError::MissingField("name"));
        }
        let email = self.contact_email();
        if email.is_empty() {
            return Err(ResumeValidationError::MissingField("email"));
        }
        if !looks_like_email(email) {
            return Err(ResumeValidationError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::loader::bundled_resume;

    #[test]
    fn test_bundled_resume_is_valid() {
        let resume = bundled_resume().unwrap();
        assert_eq!(resume.validate(), Ok(()));
    }

    #[test]
    fn test_blank_name_fails() {
        let mut resume = bundled_resume().unwrap();
        resume.name = "   ".to_string();
        assert_eq!(
            resume.validate(),
            Err(ResumeValidationError::MissingField("name"))
        );
    }

    #[test]
    fn test_missing_email_fails() {
        let mut resume = bundled_resume().unwrap();
        resume.email = String::new();
        assert_eq!(
            resume.validate(),
            Err(ResumeValidationError::MissingField("email"))
        );
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("someone@example.com"));
        assert!(!looks_like_email("someone.example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@b@example.com"));
        assert!(!looks_like_email("someone@localhost"));
        assert!(!looks_like_email("some one@example.com"));
    }
}
