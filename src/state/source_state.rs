use crate::state::Fingerprint;
use std::collections::{HashMap, HashSet};

/// Fingerprints already offered for delivery from one source
///
/// Grows monotonically for the life of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceState {
    fingerprints: HashSet<Fingerprint>,
}

impl SourceState {
    /// Creates an empty SourceState
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.fingerprints.iter()
    }

    /// Adds a fingerprint, returning true if it was not already present
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.fingerprints.insert(fingerprint)
    }

    /// Drops a fingerprint so the record is offered again next cycle
    ///
    /// Only used for at-least-once delivery, on a set that has not yet been merged.
    pub fn withdraw(&mut self, fingerprint: &Fingerprint) -> bool {
        self.fingerprints.remove(fingerprint)
    }

    /// Adds every fingerprint from `other`
    pub fn absorb(&mut self, other: SourceState) {
        self.fingerprints.extend(other.fingerprints);
    }
}

impl FromIterator<Fingerprint> for SourceState {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self {
            fingerprints: iter.into_iter().collect(),
        }
    }
}

/// Per-source fingerprint sets for the whole process
///
/// Owned by the scheduler. Workers receive a snapshot of their own source's set and hand
/// back an updated copy; [`ProcessState::merge`] is only called once every worker in a
/// cycle has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessState {
    sources: HashMap<String, SourceState>,
}

impl ProcessState {
    /// Creates an empty ProcessState
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the source's set, empty on first encounter
    pub fn snapshot(&self, source_url: &str) -> SourceState {
        self.sources.get(source_url).cloned().unwrap_or_default()
    }

    pub fn get(&self, source_url: &str) -> Option<&SourceState> {
        self.sources.get(source_url)
    }

    /// Merges a worker's returned set into the source's state
    ///
    /// The result is the union of old and returned members, so a set never shrinks.
    pub fn merge(&mut self, source_url: &str, updated: SourceState) {
        self.sources
            .entry(source_url.to_string())
            .or_default()
            .absorb(updated);
    }

    /// Number of sources with state
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Total fingerprints across all sources
    pub fn total_fingerprints(&self) -> usize {
        self.sources.values().map(SourceState::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SourceState)> {
        self.sources.iter()
    }
}

/// Filters a batch down to records not yet seen for this source
///
/// Returns the surviving items in their original order along with the updated set, which
/// holds every fingerprint in `batch` whether or not the item survived. Repeats within one
/// batch are treated as seen after their first occurrence.
pub fn deduplicate<T>(
    batch: Vec<(Fingerprint, T)>,
    seen: &SourceState,
) -> (Vec<(Fingerprint, T)>, SourceState) {
    let mut updated = seen.clone();
    let mut fresh = Vec::new();

    for (fingerprint, item) in batch {
        if updated.insert(fingerprint.clone()) {
            fresh.push((fingerprint, item));
        }
    }

    (fresh, updated)
}
