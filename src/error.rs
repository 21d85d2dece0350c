//! Error types for the Sleet ServiceNow client.
//!
//! This module defines `SleetError`, the unified error type used throughout
//! the crate for consistent error handling and propagation.
//!
//! Zero matches is deliberately NOT an error: fetch and update operations
//! normalize "not found" to `None` or an empty vector. Everything else
//! surfaces to the immediate caller unmodified.
//!
//! # Security
//!
//! All error messages are sanitized to ensure the password is never leaked
//! in logs or error responses. Use `sanitize_message()` when constructing
//! error messages from external sources.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for all Sleet operations.
///
/// Each variant provides specific context about the failure, enabling
/// meaningful error messages without leaking sensitive information
/// like the ServiceNow password.
#[derive(Error, Debug)]
pub enum SleetError {
    /// Configuration error - missing or invalid configuration values.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client initialization failed; all operations are unavailable.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP response returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The response body, potentially containing error details.
        body: String,
    },

    /// Request timed out.
    #[error("request timed out after {duration:?} - the server may be slow or unreachable")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// Authentication failed - likely bad credentials.
    #[error("authentication failed - check SNOW_USERNAME and SNOW_PASSWORD")]
    Authentication,

    /// ServiceNow returned a structured error response.
    #[error("ServiceNow API error ({status}): {message}")]
    Api {
        /// HTTP status code the error arrived with.
        status: reqwest::StatusCode,
        /// Human-readable error message from ServiceNow.
        message: String,
        /// Additional detail from the error envelope, if any.
        detail: Option<String>,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// More than one record matched a single-record fetch.
    #[error("ambiguous result: multiple records in table {table} match query {query}")]
    AmbiguousResult {
        /// The table that was queried.
        table: String,
        /// The encoded query that matched more than one record.
        query: String,
    },

    /// A `key=value` query string was malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(String),
}

impl SleetError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        SleetError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        SleetError::Config(message.into())
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        SleetError::InvalidQuery(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        SleetError::Validation(message.into())
    }

    /// Creates an ambiguous result error for a table and encoded query.
    pub fn ambiguous(table: impl Into<String>, query: impl Into<String>) -> Self {
        SleetError::AmbiguousResult {
            table: table.into(),
            query: query.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        SleetError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Sanitizes an error message to remove any occurrence of the password.
    ///
    /// This is critical for security - credentials must never appear in
    /// logs, error messages, or responses to users.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to sanitize
    /// * `password` - The password to strip from the message
    ///
    /// # Returns
    ///
    /// The message with any occurrence of the password replaced with `[REDACTED]`
    #[must_use]
    pub fn sanitize_message(message: &str, password: &str) -> String {
        if password.is_empty() {
            return message.to_string();
        }
        message.replace(password, "[REDACTED]")
    }

    /// Creates a sanitized version of this error's display message.
    ///
    /// Use this when you need to include error details in logs or responses
    /// and want to ensure no sensitive data is leaked.
    #[must_use]
    pub fn sanitized_display(&self, password: &str) -> String {
        Self::sanitize_message(&self.to_string(), password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_error() {
        let err = SleetError::missing_env("SNOW_PASSWORD");
        assert!(err.to_string().contains("SNOW_PASSWORD"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_invalid_query_error() {
        let err = SleetError::invalid_query("expected exactly one '='");
        assert_eq!(err.to_string(), "invalid query: expected exactly one '='");
    }

    #[test]
    fn test_validation_error() {
        let err = SleetError::validation("table name is required");
        assert_eq!(err.to_string(), "validation error: table name is required");
    }

    #[test]
    fn test_ambiguous_result_error() {
        let err = SleetError::ambiguous("incident", "number=INC23301");
        let msg = err.to_string();
        assert!(msg.contains("incident"));
        assert!(msg.contains("number=INC23301"));
        assert!(msg.contains("ambiguous"));
    }

    #[test]
    fn test_timeout_error() {
        let err = SleetError::timeout(Duration::from_secs(30), "GET /api/now/table/incident");
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("30s"));
    }

    #[test]
    fn test_sanitize_message_removes_password() {
        let password = "super_secret_password_12345";
        let message = format!("Error connecting as admin:{} to server", password);
        let sanitized = SleetError::sanitize_message(&message, password);
        assert!(!sanitized.contains(password));
        assert!(sanitized.contains("[REDACTED]"));
    }

    #[test]
    fn test_sanitize_message_empty_password() {
        let message = "Some error message";
        let sanitized = SleetError::sanitize_message(message, "");
        assert_eq!(sanitized, message);
    }

    #[test]
    fn test_sanitized_display_scrubs_password() {
        let err = SleetError::Config("credentials rejected for admin:hunter2".to_string());
        let display = err.sanitized_display("hunter2");
        assert!(!display.contains("hunter2"));
        assert!(display.contains("[REDACTED]"));
    }

    #[test]
    fn test_sanitize_message_no_match() {
        let message = "Some error message";
        let sanitized = SleetError::sanitize_message(message, "not_present");
        assert_eq!(sanitized, message);
    }

    #[test]
    fn test_api_error_display() {
        let err = SleetError::Api {
            status: reqwest::StatusCode::BAD_REQUEST,
            message: "Invalid table foo".to_string(),
            detail: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("Invalid table foo"));
    }
}
