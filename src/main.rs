//! Sleet - command-line client for the ServiceNow Table API
//!
//! This binary exposes the crate's four operations as subcommands, so
//! records can be fetched and updated from shell-driven automation.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `SNOW_INSTANCE`: instance subdomain or full base URL
//! - `SNOW_USERNAME`: Basic auth username
//! - `SNOW_PASSWORD`: Basic auth password
//!
//! # Usage
//!
//! ```bash
//! sleet get-record incident number=INC23301
//! sleet get-records incident --max-results 25 stage=accepted
//! sleet update-record incident number=INC23301 stage=accepted
//! sleet get-incident INC23301
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use sleet::config::Config;
use sleet::error::SleetError;
use sleet::query::QueryFilter;
use sleet::snow_client::SnowClient;

/// Sleet - ServiceNow Table API client
#[derive(Parser, Debug)]
#[command(name = "sleet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the single record matching the given filters
    ///
    /// Fails if more than one record matches; prints null when none do.
    GetRecord {
        /// Table to query (e.g. incident)
        table: String,

        /// Filter terms as field=value pairs, combined with AND
        #[arg(required = true)]
        filters: Vec<String>,
    },

    /// Fetch multiple records matching the given filters
    GetRecords {
        /// Table to query (e.g. incident)
        table: String,

        /// Maximum number of records to return
        #[arg(long, default_value_t = sleet::snow_client::DEFAULT_MAX_RESULTS)]
        max_results: u32,

        /// Filter terms as field=value pairs, combined with AND
        filters: Vec<String>,
    },

    /// Update the single record matching a key=value query
    ///
    /// Prints null and performs no update when nothing matches.
    UpdateRecord {
        /// Table to update (e.g. incident)
        table: String,

        /// Lookup query as a single key=value pair
        query: String,

        /// Fields to set, as field=value pairs
        #[arg(required = true)]
        payload: Vec<String>,
    },

    /// Look up an incident by number, returning the first match
    GetIncident {
        /// The incident number (e.g. INC23301)
        number: String,

        /// Field to match the number against
        #[arg(long, default_value = "number")]
        key: String,
    },
}

/// Builds a filter from repeated field=value arguments.
fn parse_filters(pairs: &[String]) -> Result<QueryFilter, SleetError> {
    let mut filter = QueryFilter::new();
    for pair in pairs {
        let parsed = QueryFilter::parse_pair(pair)?;
        filter = parsed
            .into_terms()
            .into_iter()
            .fold(filter, |f, (k, v)| f.with(k, v));
    }
    Ok(filter)
}

/// Builds a JSON update payload from repeated field=value arguments.
fn parse_payload(pairs: &[String]) -> Result<serde_json::Value, SleetError> {
    let mut map = serde_json::Map::new();
    for pair in pairs {
        let parsed = QueryFilter::parse_pair(pair)?;
        for (field, value) in parsed.into_terms() {
            map.insert(field, serde_json::Value::String(value));
        }
    }
    Ok(serde_json::Value::Object(map))
}

/// Prints a value as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), SleetError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Executes the selected command against the client.
async fn run(command: Commands, client: &SnowClient) -> Result<(), SleetError> {
    match command {
        Commands::GetRecord { table, filters } => {
            let filter = parse_filters(&filters)?;
            let record = client.get_record(&table, &filter).await?;
            print_json(&record)?;
        }
        Commands::GetRecords {
            table,
            max_results,
            filters,
        } => {
            let filter = parse_filters(&filters)?;
            let records = client.get_records(&table, Some(max_results), &filter).await?;
            print_json(&records)?;
        }
        Commands::UpdateRecord {
            table,
            query,
            payload,
        } => {
            let payload = parse_payload(&payload)?;
            let record = client.update_record(&table, &query, &payload).await?;
            print_json(&record)?;
        }
        Commands::GetIncident { number, key } => {
            let record = client.get_incident(&number, Some(&key)).await?;
            print_json(&record)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // Logging goes to stderr; stdout is reserved for JSON output
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sleet=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    // Load configuration from environment; a missing value fails here,
    // before any network call
    let config = Config::from_env().context("Failed to load configuration")?;

    let client = SnowClient::new(&config).context("Failed to create ServiceNow client")?;

    if let Err(e) = run(cli.command, &client).await {
        // Log the scrubbed form; the password must never reach stderr
        tracing::error!("{}", e.sanitized_display(&config.password));
        return Err(e.into());
    }

    Ok(())
}
