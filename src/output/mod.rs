//! Output module for delivering extracted events
//!
//! This module handles:
//! - Normalizing candidates into deliverable records
//! - Posting records to the ingestion API

mod publisher;
mod record;

pub use publisher::{DeliveryOutcome, HttpPublisher, Publisher};
pub use record::{EventRecord, EventStatus};
