//! Source worker - the per-source pipeline
//!
//! One worker invocation handles one source URL for one cycle:
//! - Renders the page and waits for event rows
//! - Extracts up to the configured number of candidates
//! - Fingerprints and deduplicates them against the source's set
//! - Publishes every surviving record, one at a time
//!
//! A render failure leaves the source's set untouched. Delivery failures are logged by the
//! publisher and only affect the returned set under at-least-once delivery.

use crate::config::DeliveryGuarantee;
use crate::crawler::extractor::{Extractor, ROW_MARKER};
use crate::crawler::renderer::Renderer;
use crate::output::{EventRecord, Publisher};
use crate::state::{deduplicate, SourceState};
use std::sync::Arc;
use std::time::Duration;

/// Per-worker settings taken from the configuration
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Maximum candidates extracted per cycle
    pub max_records: usize,

    /// How long the renderer may wait for event rows
    pub readiness_timeout: Duration,

    /// What happens to fingerprints of failed deliveries
    pub delivery: DeliveryGuarantee,
}

/// What one worker invocation produced
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    /// The source's set after this pass
    pub state: SourceState,

    /// False if rendering failed and the set was returned unchanged
    pub rendered: bool,

    /// Candidates extracted from the page
    pub extracted: usize,

    /// Records accepted by the ingestion API
    pub delivered: usize,

    /// Records the ingestion API did not accept
    pub failed: usize,
}

impl SourceOutcome {
    fn unchanged(state: SourceState) -> Self {
        Self {
            state,
            rendered: false,
            extracted: 0,
            delivered: 0,
            failed: 0,
        }
    }
}

/// Runs the render, extract, dedupe and publish pipeline for one source
///
/// Cheap to clone; every clone shares the same renderer, publisher and selectors.
#[derive(Clone)]
pub struct SourceWorker {
    renderer: Arc<dyn Renderer>,
    publisher: Arc<dyn Publisher>,
    extractor: Arc<Extractor>,
    settings: WorkerSettings,
}

impl SourceWorker {
    /// Creates a new worker
    pub fn new(
        renderer: Arc<dyn Renderer>,
        publisher: Arc<dyn Publisher>,
        extractor: Arc<Extractor>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            renderer,
            publisher,
            extractor,
            settings,
        }
    }

    /// Processes one source and returns its updated fingerprint set
    ///
    /// # Arguments
    ///
    /// * `url` - The source URL
    /// * `seen` - Snapshot of the source's set at the start of the cycle
    pub async fn run(&self, url: &str, seen: SourceState) -> SourceOutcome {
        let document = match self
            .renderer
            .render(url, ROW_MARKER, self.settings.readiness_timeout)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(source = %url, "Error fetching page: {}", e);
                return SourceOutcome::unchanged(seen);
            }
        };

        let candidates = self
            .extractor
            .extract(&document.html, url, self.settings.max_records);
        let extracted = candidates.len();

        let batch = candidates
            .into_iter()
            .map(|candidate| (candidate.fingerprint(), candidate))
            .collect();
        let (fresh, mut state) = deduplicate(batch, &seen);

        tracing::info!(
            source = %url,
            extracted,
            new = fresh.len(),
            "Deduplicated extracted events"
        );

        let mut delivered = 0;
        let mut failed = 0;
        for (fingerprint, candidate) in fresh {
            let record = EventRecord::from_candidate(&candidate, fingerprint);
            let outcome = self.publisher.publish(&record).await;

            if outcome.is_delivered() {
                delivered += 1;
                continue;
            }

            failed += 1;
            if self.settings.delivery == DeliveryGuarantee::AtLeastOnce {
                state.withdraw(&record.event_id);
                tracing::debug!(
                    source = %url,
                    event_id = %record.event_id,
                    "Withheld fingerprint for retry next cycle"
                );
            }
        }

        SourceOutcome {
            state,
            rendered: true,
            extracted,
            delivered,
            failed,
        }
    }
}
