//! Deliverable event records
//!
//! This module defines the normalized record sent to the ingestion API and how it is
//! built from an extracted candidate.

use crate::crawler::{normalize_date, RawCandidate};
use crate::state::Fingerprint;
use serde::Serialize;

/// Lifecycle status attached to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
}

/// One normalized event, serialized as the ingestion API payload
///
/// # Payload Format
///
/// ```json
/// {
///   "title": "Tech Expo",
///   "description": "Annual technology expo",
///   "startDate": "15-03-2025T00:00:00Z",
///   "endDate": "17-03-2025T00:00:00Z",
///   "location": "Bangalore International Exhibition Centre",
///   "tags": ["Technology"],
///   "eventId": "3f2a...",
///   "status": "upcoming"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub tags: Vec<String>,
    pub event_id: Fingerprint,
    pub status: EventStatus,
}

impl EventRecord {
    /// Normalizes a candidate into a deliverable record
    pub fn from_candidate(candidate: &RawCandidate, event_id: Fingerprint) -> Self {
        Self {
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            start_date: normalize_date(&candidate.start_date_raw),
            end_date: normalize_date(&candidate.end_date_raw),
            location: candidate.venue.clone(),
            tags: candidate.tags.clone(),
            event_id,
            status: EventStatus::Upcoming,
        }
    }
}
