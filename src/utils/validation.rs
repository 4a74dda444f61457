use crate::errors::{AppError, Result};
use regex::Regex;

pub struct Validator;

impl Validator {
    pub fn validate_email(email: &str) -> Result<()> {
        let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .map_err(|e| AppError::InternalError(format!("Regex error: {}", e)))?;

        if !email_regex.is_match(email) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }

        if email.len() > 254 {
            return Err(AppError::ValidationError("Email too long".to_string()));
        }

        Ok(())
    }

    /// Presence check for form fields; the site imposes no content policy
    /// beyond "not blank".
    pub fn require(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(AppError::ValidationError(format!("{} is required", field)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(Validator::validate_email("team@brandturn.co.in").is_ok());
        assert!(Validator::validate_email("a.b+tag@example.com").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(Validator::validate_email("not-an-email").is_err());
        assert!(Validator::validate_email("missing@tld").is_err());
        assert!(Validator::validate_email("@example.com").is_err());
    }

    #[test]
    fn require_rejects_blank_values() {
        assert!(Validator::require("name", "Asha").is_ok());
        assert!(Validator::require("name", "   ").is_err());
        assert!(Validator::require("name", "").is_err());
    }
}
