//! Storage traits and error types
//!
//! This module defines the trait interface for fingerprint stores and
//! associated error types.

use crate::state::ProcessState;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home for process state between restarts
///
/// Loaded once at startup and checkpointed after every cycle's merge.
pub trait StateStore {
    /// Loads every stored fingerprint, grouped by source URL
    fn load(&self) -> StorageResult<ProcessState>;

    /// Persists the given state
    ///
    /// Fingerprints already stored are kept; stores only ever grow.
    fn checkpoint(&mut self, state: &ProcessState) -> StorageResult<()>;
}
