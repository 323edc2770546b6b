//! Input checks shared by the stores.

use std::fmt::Display;

use crate::error::{AppError, AppResult};

/// Reject empty input, naming the field.
pub fn require(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::empty(field));
    }
    Ok(())
}

pub fn max_len(value: &str, field: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::too_long(field, max));
    }
    Ok(())
}

/// Parse a numeric identifier from whatever the caller has (an integer, a
/// path segment, a form value).
pub fn parse_id(raw: impl Display, field: &str) -> AppResult<i64> {
    let raw = raw.to_string();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::empty(field));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("non-numeric {field} provided")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank() {
        assert_eq!(
            require("  ", "forename").unwrap_err().to_string(),
            "forename is empty"
        );
        assert!(require("john", "forename").is_ok());
    }

    #[test]
    fn max_len_counts_characters() {
        assert!(max_len("ééé", "username", 3).is_ok());
        assert!(max_len("éééé", "username", 3).is_err());
    }

    #[test]
    fn parse_id_accepts_integers_and_numeric_strings() {
        assert_eq!(parse_id(7, "user_id").unwrap(), 7);
        assert_eq!(parse_id(" 12 ", "user_id").unwrap(), 12);
        assert_eq!(parse_id("-1", "user_id").unwrap(), -1);
    }

    #[test]
    fn parse_id_reports_empty_before_non_numeric() {
        assert_eq!(
            parse_id("", "user_id").unwrap_err().to_string(),
            "user_id is empty"
        );
        assert_eq!(
            parse_id("test", "user_id").unwrap_err().to_string(),
            "non-numeric user_id provided"
        );
    }
}
