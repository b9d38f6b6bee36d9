use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Event-Relay
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: SourcesConfig,
    pub ingest: IngestConfig,
    pub schedule: ScheduleConfig,
    pub render: RenderConfig,
    #[serde(default)]
    pub state: Option<StateConfig>,
}

/// Event-listing pages to poll
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// One URL per locality listing
    pub urls: Vec<String>,
}

/// Ingestion API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Endpoint that receives one POST per record
    pub endpoint: String,

    /// Bearer credential; empty means read from `INGEST_API_TOKEN`
    #[serde(default)]
    pub token: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_ingest_timeout")]
    pub timeout_secs: u64,

    /// Whether failed deliveries are re-offered on the next cycle
    #[serde(default)]
    pub delivery: DeliveryGuarantee,
}

/// Cycle timing and batch limits
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Sleep between cycles (hours)
    #[serde(rename = "interval-hours")]
    pub interval_hours: u64,

    /// Maximum records extracted per source per cycle
    #[serde(rename = "max-records")]
    pub max_records: usize,
}

/// Page rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// How long to wait for the row marker to appear (seconds)
    #[serde(rename = "readiness-timeout-secs")]
    pub readiness_timeout_secs: u64,

    /// Client identity sent with render requests
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Delay between readiness checks (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

/// Durable fingerprint storage
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Path to the SQLite database file
    pub path: String,
}

/// Delivery semantics for records whose POST fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryGuarantee {
    /// Every computed fingerprint is marked seen, delivered or not
    #[default]
    AtMostOnce,

    /// Fingerprints of failed deliveries are withheld so the record is retried
    AtLeastOnce,
}

fn default_ingest_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    500
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(60 * 60))
    }
}

impl RenderConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
