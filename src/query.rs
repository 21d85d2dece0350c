//! Query filters for the ServiceNow Table API.
//!
//! A [`QueryFilter`] is an ordered set of field/value pairs combined with
//! AND semantics by the remote query engine. It encodes to the
//! `sysparm_query` format (`field=value` terms joined with `^`).

use crate::error::SleetError;

/// An equality-conjunction filter for table queries.
///
/// Field order is preserved so the encoded query is deterministic.
///
/// # Example
///
/// ```
/// use sleet::query::QueryFilter;
///
/// let filter = QueryFilter::new()
///     .with("number", "INC23301")
///     .with("stage", "accepted");
/// assert_eq!(filter.encode().unwrap(), "number=INC23301^stage=accepted");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    terms: Vec<(String, String)>,
}

impl QueryFilter {
    /// Creates an empty filter (matches every record in the table).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exact-match term for a field.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((field.into(), value.into()));
        self
    }

    /// Parses a single `key=value` pair into a one-term filter.
    ///
    /// The string must contain exactly one `=` and a non-empty key.
    /// Anything else is an [`SleetError::InvalidQuery`], raised before
    /// any request is sent.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::InvalidQuery` for strings with zero or more
    /// than one `=`, or with an empty key.
    pub fn parse_pair(query_string: &str) -> Result<Self, SleetError> {
        let mut parts = query_string.splitn(3, '=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().ok_or_else(|| {
            SleetError::invalid_query(format!(
                "expected key=value, got {:?} (no '=' found)",
                query_string
            ))
        })?;
        if parts.next().is_some() {
            return Err(SleetError::invalid_query(format!(
                "expected exactly one '=' in {:?}",
                query_string
            )));
        }
        if key.trim().is_empty() {
            return Err(SleetError::invalid_query(format!(
                "empty key in {:?}",
                query_string
            )));
        }

        Ok(Self::new().with(key, value))
    }

    /// Returns true if the filter has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the number of terms in the filter.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Consumes the filter, returning its terms in insertion order.
    pub fn into_terms(self) -> Vec<(String, String)> {
        self.terms
    }

    /// Encodes the filter in `sysparm_query` format.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::Validation` if any field name is empty.
    pub fn encode(&self) -> Result<String, SleetError> {
        let mut encoded = String::new();
        for (field, value) in &self.terms {
            if field.trim().is_empty() {
                return Err(SleetError::validation(
                    "query filter field names must be non-empty",
                ));
            }
            if !encoded.is_empty() {
                encoded.push('^');
            }
            encoded.push_str(field);
            encoded.push('=');
            encoded.push_str(value);
        }
        Ok(encoded)
    }
}
