//! Configuration for the Sleet ServiceNow client.
//!
//! This module handles the configuration triple (instance, username,
//! password), either injected explicitly or loaded from environment
//! variables, with validation to ensure all required values are present
//! before any network activity is attempted.

use crate::error::SleetError;
use std::env;

/// Configuration for connecting to a ServiceNow instance.
///
/// All three fields are required. The password is stored but never logged
/// or exposed in error messages.
#[derive(Clone)]
pub struct Config {
    /// ServiceNow instance: either a bare subdomain (e.g. `dev78478`,
    /// expanded to `https://dev78478.service-now.com`) or a full
    /// `http(s)://` base URL.
    pub instance: String,

    /// Username for HTTP Basic authentication.
    pub username: String,

    /// Password for HTTP Basic authentication.
    /// This value must never be logged or included in error messages.
    pub password: String,
}

impl Config {
    /// Creates a configuration from explicit values.
    ///
    /// This is the dependency-injection constructor: callers embedding
    /// Sleet in a larger system pass their own credential source here
    /// instead of relying on ambient environment lookup.
    ///
    /// # Errors
    ///
    /// Returns `SleetError::Config` if any value is empty or the instance
    /// fails validation.
    pub fn new(
        instance: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, SleetError> {
        let instance = Self::validate_instance(instance.into())?;
        let username = Self::required_value("username", username.into())?;
        let password = Self::required_value("password", password.into())?;

        Ok(Config {
            instance,
            username,
            password,
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// This is the startup availability gate: call it once and treat an
    /// `Err` as "the module is disabled". No operation can be performed
    /// without a valid configuration, so a missing value fails fast here
    /// rather than deep inside a request.
    ///
    /// # Required Environment Variables
    ///
    /// - `SNOW_INSTANCE`: instance subdomain or full base URL
    /// - `SNOW_USERNAME`: Basic auth username
    /// - `SNOW_PASSWORD`: Basic auth password
    ///
    /// # Errors
    ///
    /// Returns `SleetError::Config` if any required variable is missing
    /// or empty.
    ///
    /// # Example
    ///
    /// ```ignore
    /// dotenvy::dotenv().ok();
    /// let config = Config::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self, SleetError> {
        let instance = Self::get_required_env("SNOW_INSTANCE")?;
        let username = Self::get_required_env("SNOW_USERNAME")?;
        let password = Self::get_required_env("SNOW_PASSWORD")?;

        let instance = Self::validate_instance(instance)?;

        Ok(Config {
            instance,
            username,
            password,
        })
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, SleetError> {
        env::var(name)
            .map_err(|_| SleetError::missing_env(name))
            .and_then(|value| {
                if value.trim().is_empty() {
                    Err(SleetError::missing_env(name))
                } else {
                    Ok(value)
                }
            })
    }

    /// Rejects empty values for the explicit constructor.
    fn required_value(name: &str, value: String) -> Result<String, SleetError> {
        if value.trim().is_empty() {
            Err(SleetError::invalid_config(format!(
                "configuration value {} must not be empty",
                name
            )))
        } else {
            Ok(value)
        }
    }

    /// Validates and normalizes the instance value.
    ///
    /// A full URL keeps its scheme; a bare value must look like a
    /// subdomain (no slashes or dots) and is expanded later by the client.
    fn validate_instance(instance: String) -> Result<String, SleetError> {
        let instance = instance.trim().trim_end_matches('/').to_string();

        if instance.is_empty() {
            return Err(SleetError::invalid_config(
                "configuration value instance must not be empty",
            ));
        }

        if instance.starts_with("http://") || instance.starts_with("https://") {
            // Full base URL: must parse and carry a host
            let parsed = url::Url::parse(&instance).map_err(|e| {
                SleetError::invalid_config(format!("instance URL is invalid: {}", e))
            })?;
            if parsed.host_str().is_none() {
                return Err(SleetError::invalid_config("instance URL has no host"));
            }
            return Ok(instance);
        }

        // Bare subdomain: letters, digits and hyphens only
        if !instance
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(SleetError::invalid_config(
                "instance must be a subdomain (e.g. dev78478) or a full http(s):// URL",
            ));
        }

        Ok(instance)
    }
}
