//! # Request Validation
//!
//! Field checks shared by the service façades. Each check names the field it
//! rejected so callers can report it back verbatim.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use thiserror::Error;

/// A request field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid field '{field}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

/// Non-blank string.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// Non-blank string with a plausible `local@domain.tld` shape.
pub fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    if !is_email(value) {
        return Err(ValidationError::new(field, "must be a valid email address"));
    }
    Ok(())
}

/// Optional ISO 8601 date (`YYYY-MM-DD`) or RFC 3339 timestamp.
pub fn optional_date(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        None => Ok(()),
        Some(v) if is_iso_date(v) => Ok(()),
        Some(_) => Err(ValidationError::new(field, "must be an ISO 8601 date")),
    }
}

/// Finite and strictly positive.
pub fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(field, "must be a positive number"));
    }
    Ok(())
}

/// JSON object (possibly empty).
pub fn require_object(field: &'static str, value: &Value) -> Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new(field, "must be an object"));
    }
    Ok(())
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}

fn is_iso_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_rejects_blank() {
        assert!(require("name", "Ana").is_ok());
        assert_eq!(
            require("name", "   ").unwrap_err(),
            ValidationError::new("name", "must not be empty")
        );
    }

    #[test]
    fn test_email_shapes() {
        for ok in ["ana@example.com", "a.b+c@mail.example.org"] {
            assert!(require_email("email", ok).is_ok(), "{ok}");
        }
        for bad in ["", "ana", "ana@", "@example.com", "ana@example", "ana @example.com", "a@b@c.com", "ana@example.c"] {
            assert!(require_email("email", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_optional_date() {
        assert!(optional_date("birthDate", None).is_ok());
        assert!(optional_date("birthDate", Some("1990-04-12")).is_ok());
        assert!(optional_date("birthDate", Some("1990-04-12T00:00:00Z")).is_ok());
        assert!(optional_date("birthDate", Some("12/04/1990")).is_err());
    }

    #[test]
    fn test_positive_amounts() {
        assert!(require_positive("amount", 0.01).is_ok());
        assert!(require_positive("amount", 0.0).is_err());
        assert!(require_positive("amount", -5.0).is_err());
        assert!(require_positive("amount", f64::NAN).is_err());
    }

    #[test]
    fn test_object_data() {
        assert!(require_object("data", &json!({})).is_ok());
        assert!(require_object("data", &json!([1])).is_err());
    }
}
