/// Field-level validation helpers
///
/// Request validation in TeamTask never stops at the first problem: handlers
/// collect every [`FieldError`] they find and report them together. The
/// helpers here are the shared building blocks for that (required strings,
/// due dates, identifier shape).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::object_id::ObjectId;

/// A single validation failure tied to a request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears on the wire (camelCase)
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Message used whenever a due date cannot be parsed
pub const DUE_DATE_FORMAT_MESSAGE: &str =
    "Invalid due date format; expected YYYY-MM-DD or an RFC 3339 timestamp";

/// Parses a due date
///
/// Accepted forms, all interpreted as UTC unless an offset is given:
/// - RFC 3339 (`2025-03-01T17:00:00Z`, `2025-03-01T17:00:00+02:00`)
/// - HTML `datetime-local` (`2025-03-01T17:00`, `2025-03-01T17:00:00`)
/// - calendar date (`2025-03-01`, midnight UTC)
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Returns the trimmed value, or an error when it is missing or blank
pub fn required_text(field: &str, value: Option<&str>) -> Result<String, FieldError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(FieldError::new(field, format!("{} is required", field))),
    }
}

/// Trims a text field in place so length rules see the stored value
pub fn trim_in_place(value: &mut Option<String>) {
    if let Some(text) = value {
        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            *text = trimmed.to_string();
        }
    }
}

/// Parses a reference field that must hold a 24-hex identifier
pub fn object_id_field(field: &str, value: &str) -> Result<ObjectId, FieldError> {
    ObjectId::parse(value.trim()).map_err(|_| {
        FieldError::new(
            field,
            format!(
                "Invalid {} ID format; expected a 24-character hex identifier",
                field
            ),
        )
    })
}

/// Lowercases and trims an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Joins error messages into one summary line
pub fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
