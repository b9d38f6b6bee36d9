//! Database schema definitions
//!
//! This module contains the SQL schema for the durable fingerprint store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Fingerprints already offered for delivery, per source
CREATE TABLE IF NOT EXISTS fingerprints (
    source_url TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    first_seen_at TEXT NOT NULL,
    PRIMARY KEY (source_url, fingerprint)
);

CREATE INDEX IF NOT EXISTS idx_fingerprints_source ON fingerprints(source_url);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
