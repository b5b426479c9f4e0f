// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Input validation performed before any backend call.

use serde::Deserialize;
use validator::Validate;

pub const MIN_YEAR: i64 = 2000;
pub const MAX_YEAR: i64 = 2100;

/// User-facing validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid year between 2000 and 2100")]
    InvalidYear,

    #[error("This year already exists")]
    DuplicateYear,

    #[error("Title is required")]
    MissingTitle,

    #[error("Target title is required")]
    MissingTargetTitle,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Please enter a valid email address")]
    InvalidEmail,
}

/// Parse a year number from a JSON value.
///
/// Accepts an integer or a string holding an integer. Fractions, floats and
/// anything outside `[MIN_YEAR, MAX_YEAR]` are rejected.
pub fn parse_year_number(raw: &serde_json::Value) -> Result<i32, ValidationError> {
    let value = match raw {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or(ValidationError::InvalidYear)?;

    if !(MIN_YEAR..=MAX_YEAR).contains(&value) {
        return Err(ValidationError::InvalidYear);
    }

    // Range check above keeps this in i32.
    Ok(value as i32)
}

/// Trim a resolution title, rejecting empty input.
pub fn resolution_title(raw: &str) -> Result<String, ValidationError> {
    non_empty(raw).ok_or(ValidationError::MissingTitle)
}

/// Trim a target title, rejecting empty input.
pub fn target_title(raw: &str) -> Result<String, ValidationError> {
    non_empty(raw).ok_or(ValidationError::MissingTargetTitle)
}

/// Trim an optional description; blank becomes `None`.
pub fn description(raw: Option<&str>) -> Option<String> {
    raw.and_then(non_empty)
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sign-up form as submitted by the client.
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    /// Check the form in the order the user sees the messages.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        if let Err(errors) = self.validate() {
            let fields = errors.field_errors();
            if fields.contains_key("password") {
                return Err(ValidationError::PasswordTooShort);
            }
            return Err(ValidationError::InvalidEmail);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_year_number_bounds() {
        assert_eq!(parse_year_number(&json!(2000)), Ok(2000));
        assert_eq!(parse_year_number(&json!(2100)), Ok(2100));
        assert_eq!(parse_year_number(&json!("2025")), Ok(2025));
        assert_eq!(parse_year_number(&json!(" 2031 ")), Ok(2031));

        for bad in [
            json!(1999),
            json!(2101),
            json!(-2025),
            json!(2025.5),
            json!("20x5"),
            json!(""),
            json!(null),
            json!(true),
            json!([2025]),
        ] {
            assert_eq!(
                parse_year_number(&bad),
                Err(ValidationError::InvalidYear),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_titles_are_trimmed() {
        assert_eq!(resolution_title("  Exercise "), Ok("Exercise".to_string()));
        assert_eq!(resolution_title("   "), Err(ValidationError::MissingTitle));
        assert_eq!(target_title("\t"), Err(ValidationError::MissingTargetTitle));
        assert_eq!(target_title(" 5k run"), Ok("5k run".to_string()));
    }

    #[test]
    fn test_blank_description_is_none() {
        assert_eq!(description(Some("")), None);
        assert_eq!(description(Some("   ")), None);
        assert_eq!(description(None), None);
        assert_eq!(description(Some(" daily ")), Some("daily".to_string()));
    }

    #[test]
    fn test_sign_up_form() {
        let form = |email: &str, password: &str, confirm: &str| SignUpForm {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        };

        assert_eq!(form("a@example.com", "secret1", "secret1").check(), Ok(()));
        assert_eq!(
            form("a@example.com", "secret1", "secret2").check(),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            form("a@example.com", "abc", "abc").check(),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            form("not-an-email", "secret1", "secret1").check(),
            Err(ValidationError::InvalidEmail)
        );
    }
}
