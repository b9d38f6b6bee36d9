//! State module for tracking which events have already been relayed
//!
//! # Components
//!
//! - `Fingerprint`: content hash identifying one event
//! - `SourceState`: fingerprints already offered from one source
//! - `ProcessState`: per-source sets owned by the scheduler
//! - `deduplicate`: filters a batch against a source's set

pub mod fingerprint;
mod source_state;

// Re-export main types
pub use fingerprint::Fingerprint;
pub use source_state::{deduplicate, ProcessState, SourceState};
