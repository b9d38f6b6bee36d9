//! Storage module for persisting fingerprint state
//!
//! Durable state is optional. Without it the relay keeps fingerprints in memory only and
//! forgets them on restart. With it, this module handles:
//! - SQLite database initialization and schema management
//! - Loading per-source fingerprint sets at startup
//! - Checkpointing merged state after every cycle

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStateStore;
pub use traits::{StateStore, StorageError, StorageResult};
