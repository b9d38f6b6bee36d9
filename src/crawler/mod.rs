//! Crawler module for the render-extract-deliver pipeline
//!
//! This module contains the core relay logic, including:
//! - Rendering source pages until event rows are present
//! - Extracting event candidates with selector fallbacks
//! - Normalizing listing dates
//! - The per-source worker pipeline
//! - Fixed-interval cycle scheduling

mod dates;
mod extractor;
mod renderer;
mod scheduler;
mod worker;

pub use dates::normalize_date;
pub use extractor::{ExtractError, Extractor, RawCandidate, ROW_MARKER, SENTINEL};
pub use renderer::{build_render_client, HttpRenderer, RenderedDocument, Renderer};
pub use scheduler::{CycleReport, Scheduler};
pub use worker::{SourceOutcome, SourceWorker, WorkerSettings};

use crate::config::Config;
use crate::RelayError;

/// Runs the relay until the process is terminated
///
/// This is the main entry point. It will:
/// 1. Build the renderer, publisher and extractor
/// 2. Load stored fingerprints, if durable state is configured
/// 3. Run cycles over every source, sleeping the configured interval between them
///
/// # Arguments
///
/// * `config` - The relay configuration
///
/// # Returns
///
/// * `Err(RelayError)` - Setup failed; once cycles start this never returns
///
/// # Example
///
/// ```no_run
/// use event_relay::config::load_config;
/// use event_relay::crawler::run_relay;
/// use std::path::Path;
///
/// # async fn example() -> event_relay::Result<()> {
/// let config = load_config(Path::new("relay.toml"))?;
/// run_relay(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_relay(config: Config) -> Result<(), RelayError> {
    Scheduler::from_config(&config)?.run_forever().await
}
