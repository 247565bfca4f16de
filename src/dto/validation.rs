//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_NICKNAME_LENGTH: usize = 24;

/// Validates that a nickname display name is non-empty after trimming, short
/// enough for the leaderboard, and free of control characters.
pub fn validate_nickname(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        let mut err = ValidationError::new("nickname_empty");
        err.message = Some("Nickname must not be empty".into());
        return Err(err);
    }

    if trimmed.chars().count() > MAX_NICKNAME_LENGTH {
        let mut err = ValidationError::new("nickname_length");
        err.message = Some(
            format!("Nickname must be at most {MAX_NICKNAME_LENGTH} characters").into(),
        );
        return Err(err);
    }

    if trimmed.chars().any(char::is_control) {
        let mut err = ValidationError::new("nickname_format");
        err.message = Some("Nickname must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nickname_valid() {
        assert!(validate_nickname("ana").is_ok());
        assert!(validate_nickname("  Player One  ").is_ok());
        assert!(validate_nickname("Chitãozinho").is_ok());
    }

    #[test]
    fn test_validate_nickname_empty() {
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("   ").is_err());
    }

    #[test]
    fn test_validate_nickname_too_long() {
        assert!(validate_nickname(&"x".repeat(25)).is_err());
        assert!(validate_nickname(&"x".repeat(24)).is_ok());
    }

    #[test]
    fn test_validate_nickname_control_chars() {
        assert!(validate_nickname("ana\nbeatriz").is_err());
        assert!(validate_nickname("ana\u{7}").is_err());
    }
}
