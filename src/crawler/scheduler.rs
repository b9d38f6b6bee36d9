//! Cycle scheduler
//!
//! This module runs the relay in discrete cycles:
//! - Dispatches one task per configured source, each owning its URL and a snapshot of
//!   that source's fingerprint set
//! - Waits for every task to finish before touching process state
//! - Merges returned sets, checkpoints them if a store is configured
//! - Sleeps for the fixed interval and starts over
//!
//! Process state is only written between cycles and only by the scheduler, so workers
//! never share mutable state.

use crate::config::Config;
use crate::crawler::extractor::Extractor;
use crate::crawler::renderer::HttpRenderer;
use crate::crawler::worker::{SourceOutcome, SourceWorker, WorkerSettings};
use crate::output::HttpPublisher;
use crate::state::ProcessState;
use crate::storage::{SqliteStateStore, StateStore};
use crate::RelayError;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Totals for one cycle, used for the end-of-cycle log line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Sources dispatched this cycle
    pub sources: usize,

    /// Sources whose render failed or whose task died
    pub failed_sources: usize,

    /// Candidates extracted across all sources
    pub extracted: usize,

    /// Records accepted by the ingestion API
    pub delivered: usize,

    /// Records the ingestion API did not accept
    pub failed_deliveries: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: &SourceOutcome) {
        if !outcome.rendered {
            self.failed_sources += 1;
        }
        self.extracted += outcome.extracted;
        self.delivered += outcome.delivered;
        self.failed_deliveries += outcome.failed;
    }
}

/// Drives source workers in fixed-interval cycles
pub struct Scheduler {
    sources: Vec<String>,
    worker: SourceWorker,
    interval: Duration,
    store: Option<Box<dyn StateStore + Send>>,
}

impl Scheduler {
    /// Creates a scheduler over the given sources
    ///
    /// # Arguments
    ///
    /// * `sources` - Source URLs, one task each per cycle
    /// * `worker` - The pipeline every task runs
    /// * `interval` - Sleep between cycles
    pub fn new(sources: Vec<String>, worker: SourceWorker, interval: Duration) -> Self {
        Self {
            sources,
            worker,
            interval,
            store: None,
        }
    }

    /// Builds a scheduler with HTTP rendering and delivery from a validated configuration
    ///
    /// Opens the state store when `[state]` is configured.
    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        let extractor = Extractor::new()?;

        let worker = SourceWorker::new(
            Arc::new(HttpRenderer::new(&config.render)),
            Arc::new(HttpPublisher::new(&config.ingest)?),
            Arc::new(extractor),
            WorkerSettings {
                max_records: config.schedule.max_records,
                readiness_timeout: config.render.readiness_timeout(),
                delivery: config.ingest.delivery,
            },
        );

        let mut scheduler = Self::new(
            config.sources.urls.clone(),
            worker,
            config.schedule.interval(),
        );

        if let Some(state) = &config.state {
            tracing::info!("Using durable state at {}", state.path);
            let store = SqliteStateStore::new(Path::new(&state.path))?;
            scheduler = scheduler.with_store(Box::new(store));
        }

        Ok(scheduler)
    }

    /// Attaches a store that is loaded at startup and checkpointed after every cycle
    pub fn with_store(mut self, store: Box<dyn StateStore + Send>) -> Self {
        self.store = Some(store);
        self
    }

    /// Returns the state to start from: the stored state, or empty
    pub fn initial_state(&self) -> Result<ProcessState, RelayError> {
        match &self.store {
            Some(store) => {
                let state = store.load()?;
                tracing::info!(
                    sources = state.len(),
                    fingerprints = state.total_fingerprints(),
                    "Loaded stored fingerprints"
                );
                Ok(state)
            }
            None => Ok(ProcessState::new()),
        }
    }

    /// Runs one cycle: fan out, join all, merge
    ///
    /// A source whose task fails keeps its previous set.
    pub async fn run_cycle(&self, mut state: ProcessState) -> (ProcessState, CycleReport) {
        let mut report = CycleReport {
            sources: self.sources.len(),
            ..Default::default()
        };

        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|url| {
                let worker = self.worker.clone();
                let url = url.clone();
                let seen = state.snapshot(&url);
                tokio::spawn(async move { worker.run(&url, seen).await })
            })
            .collect();

        let results = futures::future::join_all(handles).await;

        for (url, result) in self.sources.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    report.record(&outcome);
                    state.merge(url, outcome.state);
                }
                Err(e) => {
                    tracing::error!(source = %url, "Source task failed: {}", e);
                    report.failed_sources += 1;
                }
            }
        }

        (state, report)
    }

    /// Runs a cycle and checkpoints the merged state
    pub async fn run_once(&mut self, state: ProcessState) -> ProcessState {
        let started = Instant::now();
        let (state, report) = self.run_cycle(state).await;

        tracing::info!(
            sources = report.sources,
            failed_sources = report.failed_sources,
            extracted = report.extracted,
            delivered = report.delivered,
            failed_deliveries = report.failed_deliveries,
            "Cycle completed in {:?}",
            started.elapsed()
        );

        self.checkpoint(&state);
        state
    }

    /// Runs cycles forever, sleeping the configured interval between them
    ///
    /// Only fails if the stored state cannot be loaded at startup.
    pub async fn run_forever(mut self) -> Result<(), RelayError> {
        let mut state = self.initial_state()?;

        loop {
            state = self.run_once(state).await;

            let now = chrono::Utc::now();
            let next = now + chrono::Duration::from_std(self.interval)
                .unwrap_or_else(|_| chrono::Duration::zero());
            tracing::info!("Data fetched at {}; next cycle at {}", now, next);

            tokio::time::sleep(self.interval).await;
        }
    }

    fn checkpoint(&mut self, state: &ProcessState) {
        if let Some(store) = self.store.as_mut() {
            match store.checkpoint(state) {
                Ok(()) => tracing::debug!(
                    fingerprints = state.total_fingerprints(),
                    "Checkpointed fingerprint state"
                ),
                Err(e) => tracing::error!("Failed to checkpoint fingerprint state: {}", e),
            }
        }
    }
}
