//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the StateStore trait.

use crate::state::{Fingerprint, ProcessState, SourceState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StateStore, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

/// SQLite fingerprint store
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Opens or creates the store at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStateStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl StateStore for SqliteStateStore {
    fn load(&self) -> StorageResult<ProcessState> {
        let mut stmt = self
            .conn
            .prepare("SELECT source_url, fingerprint FROM fingerprints")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut by_source: HashMap<String, SourceState> = HashMap::new();
        for row in rows {
            let (source_url, fingerprint) = row?;
            by_source
                .entry(source_url)
                .or_default()
                .insert(Fingerprint::from_hex(fingerprint));
        }

        let mut state = ProcessState::new();
        for (source_url, fingerprints) in by_source {
            state.merge(&source_url, fingerprints);
        }

        Ok(state)
    }

    fn checkpoint(&mut self, state: &ProcessState) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO fingerprints (source_url, fingerprint, first_seen_at)
                 VALUES (?1, ?2, ?3)",
            )?;

            for (source_url, fingerprints) in state.iter() {
                for fingerprint in fingerprints.iter() {
                    stmt.execute(params![source_url, fingerprint.as_str(), now])?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fp(s: &str) -> Fingerprint {
        Fingerprint::from_hex(s)
    }

    fn sample_state() -> ProcessState {
        let mut state = ProcessState::new();
        state.merge(
            "https://a.example/events",
            [fp("a1"), fp("a2")].into_iter().collect(),
        );
        state.merge("https://b.example/events", [fp("b1")].into_iter().collect());
        state
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStateStore::new_in_memory().is_ok());
    }

    #[test]
    fn test_load_empty() {
        let store = SqliteStateStore::new_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_checkpoint_then_load() {
        let mut store = SqliteStateStore::new_in_memory().unwrap();
        let state = sample_state();

        store.checkpoint(&state).unwrap();

        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_checkpoint_is_idempotent_and_grows() {
        let mut store = SqliteStateStore::new_in_memory().unwrap();
        store.checkpoint(&sample_state()).unwrap();
        store.checkpoint(&sample_state()).unwrap();

        let mut more = ProcessState::new();
        more.merge("https://a.example/events", [fp("a3")].into_iter().collect());
        store.checkpoint(&more).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.total_fingerprints(), 4);
        assert_eq!(loaded.get("https://a.example/events").unwrap().len(), 3);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("relay.db");

        {
            let mut store = SqliteStateStore::new(&path).unwrap();
            store.checkpoint(&sample_state()).unwrap();
        }

        let store = SqliteStateStore::new(&path).unwrap();
        assert_eq!(store.load().unwrap(), sample_state());
    }
}
