//! Common types and utilities shared across models.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Current time as a fixed-width RFC 3339 string.
///
/// Fixed microsecond precision keeps stored timestamps lexicographically
/// ordered, which `ORDER BY created_at` relies on.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Identity and timestamps shared by every persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Record {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Record {
    /// Fresh record with a random UUID and both timestamps set to now
    pub fn new() -> Self {
        let now = now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Refresh `updated_at` after a mutation
    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Reject empty or whitespace-only strings
pub fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Reject values outside `[min, max]`, including NaN and infinities
pub fn require_in_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("{} must be between {} and {}", field, min, max),
        ));
    }
    Ok(())
}

/// For `Option<Option<T>>` fields marked `#[serde(default, deserialize_with = "nullable")]`.
/// An absent key stays `None` and an explicit `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
