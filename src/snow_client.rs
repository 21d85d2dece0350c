//! HTTP client for the ServiceNow Table API.
//!
//! This module provides [`SnowClient`] for making authenticated requests
//! against `/api/now/table/{name}` endpoints, [`Table`] handles bound to a
//! single table, and [`RecordStream`] for lazy iteration over query
//! results.
//!
//! Each operation performs one blocking round trip per page and holds no
//! shared mutable state; concurrent callers can clone the client freely.
//! There is no retry policy: transient failures propagate to the caller.
//!
//! # Security
//!
//! The password is never logged. All error messages are sanitized before
//! being surfaced.

use std::collections::VecDeque;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};

use crate::config::Config;
use crate::error::SleetError;
use crate::query::QueryFilter;
use crate::record::{ApiErrorBody, Record, RecordEnvelope, RecordList};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum number of records returned by [`SnowClient::get_records`].
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Number of records fetched per round trip when streaming.
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum length for HTTP error response bodies to avoid leaking verbose
/// ServiceNow internals.
const MAX_ERROR_BODY_LEN: usize = 500;

/// HTTP client for the ServiceNow Table API.
///
/// Handles authentication, request formatting, and response parsing.
/// Construction is lazy: no connection is opened until the first
/// operation runs.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let client = SnowClient::new(&config)?;
///
/// let incident = client.get_incident("INC23301", None).await?;
/// ```
#[derive(Clone)]
pub struct SnowClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Base URL for the instance (e.g., `https://dev78478.service-now.com`).
    base_url: String,

    /// Basic auth username.
    username: String,

    /// Basic auth password.
    /// SECURITY: Never log this value!
    password: String,
}

impl SnowClient {
    /// Creates a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::HttpClient` if the HTTP client fails to
    /// initialize; in that case every operation is unavailable.
    pub fn new(config: &Config) -> Result<Self, SleetError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(SleetError::HttpClient)?;

        let base_url = Self::instance_base_url(&config.instance);

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Expands an instance value into a base URL.
    ///
    /// A bare subdomain becomes `https://{instance}.service-now.com`;
    /// a full URL is used as-is (trailing slash stripped).
    fn instance_base_url(instance: &str) -> String {
        let instance = instance.trim_end_matches('/');
        if instance.starts_with("http://") || instance.starts_with("https://") {
            instance.to_string()
        } else {
            format!("https://{}.service-now.com", instance)
        }
    }

    /// Validates a table name before it is interpolated into a URL path.
    ///
    /// ServiceNow table names are lowercase identifiers; anything else is
    /// rejected to prevent path injection via crafted names.
    fn validate_table_name(name: &str) -> Result<(), SleetError> {
        if name.is_empty()
            || !name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err(SleetError::validation(format!(
                "table name must be a lowercase identifier, got: {:?}",
                name.chars().take(50).collect::<String>()
            )));
        }
        Ok(())
    }

    /// Creates a handle bound to one table's endpoint.
    ///
    /// This is the remote-table client factory: it has no side effects
    /// beyond handle construction, and no request is sent until an
    /// operation on the returned [`Table`] runs.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::Validation` if the table name is malformed.
    pub fn table(&self, name: &str) -> Result<Table, SleetError> {
        Self::validate_table_name(name)?;
        Ok(Table {
            client: self.clone(),
            name: name.to_string(),
        })
    }

    /// Fetches a single record from a table.
    ///
    /// Sends the filter as an equality-conjunction query and returns the
    /// one matching record, or `None` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::AmbiguousResult` if more than one record
    /// matches; a multi-match is never silently collapsed to the first.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let filter = QueryFilter::new().with("number", "INC23301");
    /// let record = client.get_record("incident", &filter).await?;
    /// ```
    pub async fn get_record(
        &self,
        tablename: &str,
        filter: &QueryFilter,
    ) -> Result<Option<Record>, SleetError> {
        self.table(tablename)?.get_one(filter).await
    }

    /// Fetches multiple records from a table, in remote order.
    ///
    /// At most `max_results` records are returned (default
    /// [`DEFAULT_MAX_RESULTS`]). The result set is streamed lazily: no
    /// more than `max_results` records are ever requested from the
    /// remote.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let filter = QueryFilter::new().with("stage", "accepted");
    /// let records = client.get_records("incident", Some(25), &filter).await?;
    /// ```
    pub async fn get_records(
        &self,
        tablename: &str,
        max_results: Option<u32>,
        filter: &QueryFilter,
    ) -> Result<Vec<Record>, SleetError> {
        let limit = max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        self.table(tablename)?
            .records(filter.clone())
            .take(limit)
            .await
    }

    /// Updates a record located by a `key=value` query string.
    ///
    /// The query string must contain exactly one `=`. The lookup uses
    /// single-match semantics: zero matches makes the whole operation a
    /// no-op returning `None` (no update request is sent), and multiple
    /// matches fail with `AmbiguousResult`. On a single match, `payload`
    /// is applied as a partial update and the updated record is returned.
    /// Last-writer-wins; no optimistic-concurrency check is performed.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::InvalidQuery` for a malformed query string.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let updated = client
    ///     .update_record("incident", "number=INC23301", &json!({"stage": "accepted"}))
    ///     .await?;
    /// ```
    pub async fn update_record(
        &self,
        tablename: &str,
        query_string: &str,
        payload: &serde_json::Value,
    ) -> Result<Option<Record>, SleetError> {
        let filter = QueryFilter::parse_pair(query_string)?;
        self.table(tablename)?.update(&filter, payload).await
    }

    /// Looks up an incident by number.
    ///
    /// A convenience specialization fixed to the `incident` table. `key`
    /// defaults to `number` when `None`. Unlike [`SnowClient::get_record`],
    /// this returns the FIRST match and tolerates duplicates without
    /// erroring; the asymmetry is part of the operation's contract.
    pub async fn get_incident(
        &self,
        incident_number: &str,
        key: Option<&str>,
    ) -> Result<Option<Record>, SleetError> {
        let key = key.unwrap_or("number");
        let filter = QueryFilter::new().with(key, incident_number);
        let mut stream = self.table("incident")?.records(filter).with_page_size(1);
        stream.try_next().await
    }

    /// Fetches one page of results from a table endpoint.
    async fn fetch_page(
        &self,
        table: &str,
        filter: &QueryFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Record>, SleetError> {
        let url = format!("{}/api/now/table/{}", self.base_url, table);

        tracing::debug!(
            table = table,
            limit = limit,
            offset = offset,
            "Fetching records"
        );

        let mut params: Vec<(&str, String)> = vec![
            ("sysparm_limit", limit.to_string()),
            ("sysparm_offset", offset.to_string()),
        ];
        if !filter.is_empty() {
            params.push(("sysparm_query", filter.encode()?));
        }

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e, Method::GET, table))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_http_error(status, response).await);
        }

        let body = response.text().await.map_err(SleetError::Http)?;

        tracing::trace!(body = %body, "Table API response");

        let list: RecordList = serde_json::from_str(&body).map_err(SleetError::Serialization)?;
        Ok(list.result)
    }

    /// Applies a partial update to one record identified by `sys_id`.
    async fn patch_record(
        &self,
        table: &str,
        sys_id: &str,
        payload: &serde_json::Value,
    ) -> Result<Record, SleetError> {
        if !payload.is_object() {
            return Err(SleetError::validation(
                "update payload must be a JSON object",
            ));
        }

        let url = format!("{}/api/now/table/{}/{}", self.base_url, table, sys_id);

        tracing::debug!(table = table, sys_id = sys_id, "Updating record");

        let response = self
            .http
            .patch(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e, Method::PATCH, table))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_http_error(status, response).await);
        }

        let envelope: RecordEnvelope = response.json().await.map_err(SleetError::Http)?;
        Ok(envelope.result)
    }

    /// Maps a reqwest transport error, distinguishing timeouts.
    fn transport_error(&self, e: reqwest::Error, method: Method, table: &str) -> SleetError {
        if e.is_timeout() {
            return SleetError::timeout(
                Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                format!("{} /api/now/table/{}", method, table),
            );
        }
        SleetError::Http(e)
    }

    /// Handles HTTP-level errors and converts them to `SleetError`.
    ///
    /// Tries to parse the ServiceNow error envelope for a structured
    /// error; otherwise falls back to the raw status and truncated body.
    async fn handle_http_error(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> SleetError {
        let body = response.text().await.unwrap_or_default();
        // Sanitize the body to ensure no credential leakage
        let body = SleetError::sanitize_message(&body, &self.password);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return SleetError::Authentication;
        }

        if let Ok(envelope) = serde_json::from_str::<ApiErrorBody>(&body) {
            return SleetError::Api {
                status,
                message: envelope.error.message,
                detail: envelope.error.detail,
            };
        }

        // Truncate to avoid leaking verbose ServiceNow internals. The cut
        // must land on a char boundary or slicing panics on UTF-8 bodies.
        let body = if body.len() > MAX_ERROR_BODY_LEN {
            let mut end = MAX_ERROR_BODY_LEN;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...[truncated]", &body[..end])
        } else {
            body
        };

        SleetError::HttpStatus { status, body }
    }
}

/// A handle bound to one table's endpoint.
///
/// Produced by [`SnowClient::table`]. Holding a `Table` opens no
/// connection; requests are sent only when an operation runs.
#[derive(Clone)]
pub struct Table {
    client: SnowClient,
    name: String,
}

impl Table {
    /// Returns the table name this handle is bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a lazy stream over the records matching `filter`.
    pub fn records(&self, filter: QueryFilter) -> RecordStream {
        RecordStream::new(self.clone(), filter)
    }

    /// Fetches the single record matching `filter`.
    ///
    /// Requests at most two records, so the ambiguity check never forces
    /// the remote to materialize the full result set.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::AmbiguousResult` if more than one record
    /// matches.
    pub async fn get_one(&self, filter: &QueryFilter) -> Result<Option<Record>, SleetError> {
        let mut page = self.client.fetch_page(&self.name, filter, 2, 0).await?;
        match page.len() {
            0 => Ok(None),
            1 => Ok(page.pop()),
            _ => Err(SleetError::ambiguous(&self.name, filter.encode()?)),
        }
    }

    /// Updates the single record matching `filter` with `payload`.
    ///
    /// Zero matches is a no-op returning `None`: no update request is
    /// sent. One match is patched and the updated record returned.
    pub async fn update(
        &self,
        filter: &QueryFilter,
        payload: &serde_json::Value,
    ) -> Result<Option<Record>, SleetError> {
        let Some(record) = self.get_one(filter).await? else {
            tracing::debug!(table = %self.name, "No record matched, skipping update");
            return Ok(None);
        };

        let sys_id = record.sys_id()?;
        let updated = self.client.patch_record(&self.name, sys_id, payload).await?;
        Ok(Some(updated))
    }
}

/// A restartable, finite, lazy stream of records.
///
/// Pages through results with `sysparm_limit`/`sysparm_offset`, fetching
/// a page per round trip only as items are consumed. Composing with
/// [`RecordStream::take`] caps every page request at the remaining count,
/// so a bounded fetch never requests records past its bound.
pub struct RecordStream {
    table: Table,
    filter: QueryFilter,
    page_size: u32,
    offset: u32,
    buffer: VecDeque<Record>,
    exhausted: bool,
}

impl RecordStream {
    fn new(table: Table, filter: QueryFilter) -> Self {
        Self {
            table,
            filter,
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Overrides the number of records requested per round trip.
    ///
    /// Zero is clamped to one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Restarts the stream from the beginning.
    ///
    /// The next item is re-fetched from the remote; results are not cached.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.buffer.clear();
        self.exhausted = false;
    }

    /// Returns the next record, or `None` when the remote result set is
    /// exhausted.
    pub async fn try_next(&mut self) -> Result<Option<Record>, SleetError> {
        if let Some(record) = self.buffer.pop_front() {
            return Ok(Some(record));
        }
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .table
            .client
            .fetch_page(&self.table.name, &self.filter, self.page_size, self.offset)
            .await?;

        self.offset += page.len() as u32;
        // A short page means the remote has nothing further
        if (page.len() as u32) < self.page_size {
            self.exhausted = true;
        }
        self.buffer.extend(page);

        Ok(self.buffer.pop_front())
    }

    /// Collects at most `n` records, in remote order.
    ///
    /// Truncation happens during iteration: each page request is capped
    /// at the count still needed, so the remote is never asked for more
    /// than `n` records in total. `take(0)` sends no request at all.
    pub async fn take(mut self, n: u32) -> Result<Vec<Record>, SleetError> {
        let mut records = Vec::with_capacity(n.min(DEFAULT_PAGE_SIZE) as usize);

        while (records.len() as u32) < n {
            let remaining = n - records.len() as u32;
            if self.page_size > remaining {
                self.page_size = remaining;
            }
            match self.try_next().await? {
                Some(record) => records.push(record),
                None => break,
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_instance_base_url_expands_subdomain() {
        assert_eq!(
            SnowClient::instance_base_url("dev78478"),
            "https://dev78478.service-now.com"
        );
    }

    #[test]
    fn test_instance_base_url_passes_through_full_url() {
        assert_eq!(
            SnowClient::instance_base_url("https://snow.example.com"),
            "https://snow.example.com"
        );
        assert_eq!(
            SnowClient::instance_base_url("https://snow.example.com/"),
            "https://snow.example.com"
        );
        assert_eq!(
            SnowClient::instance_base_url("http://localhost:8080"),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_validate_table_name_valid() {
        assert!(SnowClient::validate_table_name("incident").is_ok());
        assert!(SnowClient::validate_table_name("cmdb_ci_server").is_ok());
        assert!(SnowClient::validate_table_name("u_custom2").is_ok());
    }

    #[test]
    fn test_validate_table_name_rejects_empty() {
        let err = SnowClient::validate_table_name("").unwrap_err();
        assert!(err.to_string().contains("table name"));
    }

    #[test]
    fn test_validate_table_name_rejects_path_injection() {
        assert!(SnowClient::validate_table_name("incident/..").is_err());
        assert!(SnowClient::validate_table_name("../etc/passwd").is_err());
        assert!(SnowClient::validate_table_name("Incident").is_err());
        assert!(SnowClient::validate_table_name("incident table").is_err());
    }

    #[test]
    fn test_table_factory_binds_name() {
        let config = Config::new("dev78478", "admin", "hunter2").unwrap();
        let client = SnowClient::new(&config).unwrap();
        let table = client.table("incident").unwrap();
        assert_eq!(table.name(), "incident");
    }

    #[test]
    fn test_table_factory_rejects_bad_name() {
        let config = Config::new("dev78478", "admin", "hunter2").unwrap();
        let client = SnowClient::new(&config).unwrap();
        assert!(client.table("bad table").is_err());
    }
}
