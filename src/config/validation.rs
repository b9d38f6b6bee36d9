use crate::config::types::{Config, IngestConfig, RenderConfig, ScheduleConfig, SourcesConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Longest allowed sleep between cycles (one year)
const MAX_INTERVAL_HOURS: u64 = 24 * 365;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_sources(&config.sources)?;
    validate_ingest(&config.ingest)?;
    validate_schedule(&config.schedule)?;
    validate_render(&config.render)?;

    if let Some(state) = &config.state {
        if state.path.is_empty() {
            return Err(ConfigError::Validation(
                "state path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the list of source pages
fn validate_sources(config: &SourcesConfig) -> Result<(), ConfigError> {
    if config.urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one source URL is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for source in &config.urls {
        validate_http_url(source, "source URL")?;

        if !seen.insert(source.as_str()) {
            return Err(ConfigError::Validation(format!(
                "source URL '{}' is listed more than once",
                source
            )));
        }
    }

    Ok(())
}

/// Validates ingestion API settings
fn validate_ingest(config: &IngestConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.endpoint, "ingest endpoint")?;

    if config.token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "ingest token is empty and INGEST_API_TOKEN is not set".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates cycle timing
fn validate_schedule(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if config.interval_hours < 1 || config.interval_hours > MAX_INTERVAL_HOURS {
        return Err(ConfigError::Validation(format!(
            "interval-hours must be between 1 and {}, got {}",
            MAX_INTERVAL_HOURS, config.interval_hours
        )));
    }

    if config.max_records < 1 || config.max_records > 1000 {
        return Err(ConfigError::Validation(format!(
            "max-records must be between 1 and 1000, got {}",
            config.max_records
        )));
    }

    Ok(())
}

/// Validates renderer settings
fn validate_render(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.readiness_timeout_secs < 1 || config.readiness_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "readiness-timeout-secs must be between 1 and 300, got {}",
            config.readiness_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms must be >= 10, got {}",
            config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Checks that a URL parses and uses http or https
fn validate_http_url(raw: &str, what: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("{} '{}': {}", what, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            what, raw
        )));
    }

    Ok(())
}
