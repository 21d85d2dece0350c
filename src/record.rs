//! Record and response envelope types for the ServiceNow Table API.
//!
//! Records are opaque to this crate: the remote system owns the schema,
//! and callers receive the raw JSON object. The only field the crate
//! itself reads is `sys_id`, which addresses the update endpoint.

use serde::{Deserialize, Serialize};

use crate::error::SleetError;

/// A single row returned by the Table API.
///
/// Wraps the raw JSON object without interpreting its fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Record(pub serde_json::Map<String, serde_json::Value>);

impl Record {
    /// Returns a field value, if present.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    /// Returns a field as a string slice, if present and a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|v| v.as_str())
    }

    /// Returns the record's `sys_id`.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::Validation` if the record has no string
    /// `sys_id` field; every row served by the Table API carries one, so
    /// its absence indicates a malformed response.
    pub fn sys_id(&self) -> Result<&str, SleetError> {
        self.get_str("sys_id")
            .ok_or_else(|| SleetError::validation("record has no sys_id field"))
    }

    /// Consumes the record, returning the underlying JSON object.
    pub fn into_inner(self) -> serde_json::Map<String, serde_json::Value> {
        self.0
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Record(map)
    }
}

/// Envelope for collection responses: `{"result": [ ... ]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordList {
    /// The matching records, in the order the remote system yields them.
    #[serde(default)]
    pub result: Vec<Record>,
}

/// Envelope for single-record responses: `{"result": { ... }}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEnvelope {
    /// The single record.
    pub result: Record,
}

/// Error envelope returned by ServiceNow on failed requests.
///
/// ```json
/// {"error": {"message": "...", "detail": "..."}, "status": "failure"}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// The error payload.
    pub error: ApiErrorDetail,

    /// Status string, typically "failure".
    #[serde(default)]
    pub status: String,
}

/// The message/detail pair inside a ServiceNow error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,

    /// Additional detail, often null.
    #[serde(default)]
    pub detail: Option<String>,
}
