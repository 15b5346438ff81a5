// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for smsrelay.

use serde::Serialize;
use thiserror::Error;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field (e.g. `phone`, `messageType`).
    pub field: String,
    /// Human-readable reason.
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

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The primary error type used across the lifecycle, query, storage and gateway crates.
#[derive(Debug, Error)]
pub enum SmsRelayError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The persistence collaborator failed. Nothing is assumed committed.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input reached the core.
    #[error("validation failed: {}", format_fields(fields))]
    Validation { fields: Vec<FieldError> },

    /// Notification delivery failed after a successful write.
    #[error("broadcast error: {message}")]
    Broadcast { message: String },

    /// HTTP/WebSocket gateway errors (bind failure, serve failure).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SmsRelayError {
    /// Shorthand for a message lookup miss.
    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "message",
            id: id.into(),
        }
    }

    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            fields: vec![FieldError::new(field, message)],
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let err = SmsRelayError::Validation {
            fields: vec![
                FieldError::new("phone", "must not be empty"),
                FieldError::new("app", "must not be empty"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "validation failed: phone: must not be empty; app: must not be empty"
        );
    }

    #[test]
    fn not_found_helper() {
        let err = SmsRelayError::message_not_found("abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "message not found: abc");
    }

    #[test]
    fn storage_error_wraps_source() {
        let err = SmsRelayError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        };
        assert!(err.to_string().contains("disk gone"));
        assert!(!err.is_not_found());
    }
}
