//! Event-Relay: a polling event-listing relay
//!
//! This crate periodically renders event-directory pages, extracts event rows,
//! deduplicates them by content fingerprint and forwards new records to an
//! ingestion API.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Event-Relay operations
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extract(#[from] crawler::ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while rendering a source page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out after {secs}s waiting for {url} to become ready")]
    Timeout {
        url: String,
        secs: u64,
        /// Start of the last body fetched before giving up, if any
        last_excerpt: Option<String>,
    },

    #[error("Invalid readiness selector: {0}")]
    InvalidSelector(String),
}

/// Errors raised while delivering a record to the ingestion API
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ingestion API rejected record with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Result type alias for Event-Relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_relay, Scheduler};
pub use output::EventRecord;
pub use state::{Fingerprint, ProcessState, SourceState};
