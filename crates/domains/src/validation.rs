//! Input checks run before any unit of work is opened.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::errors::{DomainError, Result};
use crate::models::Rating;

pub const MAX_CONTENT_LEN: usize = 5_000;
pub const MAX_TITLE_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 1_000;

/// Reasons a reporter may cite.
pub const REPORT_REASONS: &[&str] = &[
    "spam",
    "offensive",
    "harassment",
    "misleading",
    "fraud",
    "irrelevant",
    "other",
];

/// Trims `raw` and rejects it when blank or oversized. `label` names the
/// field in the error message.
pub fn validate_content(label: &str, raw: &str) -> Result<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(DomainError::validation(format!("{label} must not be empty")));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(DomainError::validation(format!(
            "{label} must be at most {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(content.to_string())
}

/// Ratings arrive as JSON numbers or numeric strings.
pub fn validate_rating(raw: Option<&Value>) -> Result<Rating> {
    let value = match raw {
        None | Some(Value::Null) => return Err(DomainError::validation("rating is required")),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    value
        .ok_or_else(|| DomainError::validation("rating must be an integer between 1 and 5"))
        .and_then(Rating::new)
}

pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

/// Blank descriptions collapse to `None`.
pub fn validate_description(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(DomainError::validation(
            format!("description must be at most {MAX_DESCRIPTION_LEN} characters"),
        )),
        Some(text) => Ok(Some(text.to_string())),
    }
}

/// Normalizes the cited reasons into a set. At least one known reason is required.
pub fn validate_reasons<S: AsRef<str>>(reasons: &[S]) -> Result<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for reason in reasons {
        let reason = reason.as_ref().trim().to_ascii_lowercase();
        if !REPORT_REASONS.contains(&reason.as_str()) {
            return Err(DomainError::validation(format!("unknown report reason '{reason}'")));
        }
        set.insert(reason);
    }
    if set.is_empty() {
        return Err(DomainError::validation("at least one report reason is required"));
    }
    Ok(set)
}
