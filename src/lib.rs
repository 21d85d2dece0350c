//! # Sleet
//!
//! Sleet is a client for the ServiceNow Table API, covering the handful
//! of fetch and update operations needed to manage ITSM records from
//! automation tooling.
//!
//! ## Features
//!
//! - **Single-record fetch**: equality-conjunction queries with an
//!   explicit ambiguity check when more than one record matches
//! - **Multi-record fetch**: lazily streamed results truncated to a
//!   caller-supplied bound without materializing the full result set
//! - **Partial updates**: locate a record by a `key=value` query and
//!   apply a last-writer-wins partial update
//! - **Incident lookup**: first-match convenience lookup on the
//!   `incident` table
//! - **Security**: the password is never logged or exposed in error
//!   messages
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - The instance/username/password configuration triple
//! - [`error`] - Error types with security-conscious message sanitization
//! - [`query`] - Equality-conjunction query filters
//! - [`record`] - Opaque records and response envelopes
//! - [`snow_client`] - HTTP client, table handles, and record streams
//!
//! ## Configuration
//!
//! Sleet requires three values, loadable from environment variables:
//!
//! - `SNOW_INSTANCE`: instance subdomain (e.g. `dev78478`) or full base URL
//! - `SNOW_USERNAME`: Basic auth username
//! - `SNOW_PASSWORD`: Basic auth password
//!
//! Missing any of the three disables the module: [`config::Config`]
//! construction fails before any network call is attempted.
//!
//! ## Example
//!
//! Using the [`SnowClient`](snow_client::SnowClient) directly:
//!
//! ```ignore
//! use sleet::config::Config;
//! use sleet::query::QueryFilter;
//! use sleet::snow_client::SnowClient;
//!
//! async fn example() -> Result<(), sleet::error::SleetError> {
//!     let config = Config::from_env()?;
//!     let client = SnowClient::new(&config)?;
//!
//!     // Fetch up to 10 accepted incidents
//!     let filter = QueryFilter::new().with("stage", "accepted");
//!     let records = client.get_records("incident", None, &filter).await?;
//!     for record in records {
//!         println!("{:?}", record.get_str("number"));
//!     }
//!
//!     // Move one incident along
//!     let updated = client
//!         .update_record("incident", "number=INC23301", &serde_json::json!({"stage": "accepted"}))
//!         .await?;
//!     println!("updated: {}", updated.is_some());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod query;
pub mod record;
pub mod snow_client;
