//! Validation rules for create and update drafts.
//!
//! Field rules are pure and run before any request is made. Uniqueness is
//! checked against a snapshot of existing records supplied by the caller; the
//! backend remains the final authority for concurrent creators.

mod configuration;
mod permission;
mod role;
mod warehouse;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::models::EntityPayload;

pub const NAME_IN_USE: &str = "name already in use";
pub const CODE_IN_USE: &str = "code already in use";
pub const REQUIRED: &str = "is required";

/// Permission and warehouse codes, configuration types.
pub static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z_]+$").expect("valid code pattern"));

const MAX_NAME_LEN: usize = 120;
const MAX_TEXT_LEN: usize = 2000;

/// Which operation a draft is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Update,
}

/// Field-indexed validation messages. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<BTreeMap<String, Vec<String>>> for ValidationErrors {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validation contract implemented by every entity draft.
pub trait DraftSchema<E>: DeserializeOwned + Clone + Default + Send + Sync + 'static {
    /// Pre-populate an edit draft from an existing record.
    fn from_entity(entity: &E) -> Self;

    /// Field rules. Never performs I/O.
    fn validate(&self, mode: DraftMode) -> Result<EntityPayload, ValidationErrors>;

    /// Compare against existing records, skipping `exclude_id` (the record being edited).
    fn check_unique(&self, snapshot: &[E], exclude_id: Option<&str>) -> Result<(), ValidationErrors>;
}

/// Trimmed value of a required field, recording an error when blank.
pub(crate) fn required(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, format!("{} {}", field, REQUIRED));
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Required, and matching `pattern`.
pub(crate) fn code(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    pattern: &Regex,
) -> Option<String> {
    let value = required(errors, field, value)?;
    if pattern.is_match(&value) {
        Some(value)
    } else {
        errors.add(
            field,
            format!("{} must match {}", field, pattern.as_str()),
        );
        None
    }
}

pub(crate) fn max_len(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("{} must be at most {} characters", field, max));
    }
}

pub(crate) fn name(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<String> {
    let value = required(errors, field, value)?;
    max_len(errors, field, &value, MAX_NAME_LEN);
    Some(value)
}

pub(crate) fn optional_text(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<String> {
    let trimmed = value.trim();
    max_len(errors, field, trimmed, MAX_TEXT_LEN);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Positive integer identifier such as a country id.
pub(crate) fn positive_id(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<i64> {
    let value = required(errors, field, value)?;
    match value.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.add(field, format!("{} must be a positive number", field));
            None
        }
    }
}

pub(crate) fn non_negative(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };
    match trimmed.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, format!("{} must be a whole number of zero or more", field));
            None
        }
    }
}

/// Case-insensitive comparison after trimming.
pub(crate) fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Records of `snapshot` other than the one being edited.
pub(crate) fn others<'a, E: crate::models::AdminEntity>(
    snapshot: &'a [E],
    exclude_id: Option<&'a str>,
) -> impl Iterator<Item = &'a E> {
    snapshot
        .iter()
        .filter(move |record| Some(record.id()) != exclude_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_pattern() {
        assert!(CODE_PATTERN.is_match("TAX_RULES"));
        assert!(!CODE_PATTERN.is_match("tax_rules"));
        assert!(!CODE_PATTERN.is_match("TAX-RULES"));
        assert!(!CODE_PATTERN.is_match("TAX1"));
    }

    #[test]
    fn test_required_trims() {
        let mut errors = ValidationErrors::default();
        assert_eq!(required(&mut errors, "name", "  North  ").as_deref(), Some("North"));
        assert!(required(&mut errors, "code", "   ").is_none());
        assert_eq!(errors.first("code"), Some("code is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_same_label_ignores_case_and_whitespace() {
        assert!(same_label(" Main Hub", "main hub "));
        assert!(!same_label("Main Hub", "Main Hub 2"));
    }

    #[test]
    fn test_positive_id() {
        let mut errors = ValidationErrors::default();
        assert_eq!(positive_id(&mut errors, "countryId", "12"), Some(12));
        assert_eq!(positive_id(&mut errors, "countryId", "-1"), None);
        assert_eq!(
            errors.first("countryId"),
            Some("countryId must be a positive number")
        );
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = ValidationErrors::default();
        errors.add("code", "code is required");
        errors.add("name", NAME_IN_USE);
        assert_eq!(
            errors.to_string(),
            "code: code is required; name: name already in use"
        );
    }
}
