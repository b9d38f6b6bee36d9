/// Content fingerprints used as event identity
///
/// A fingerprint is the hex SHA-256 of an event's identity-bearing fields. It depends only
/// on field content, so the same listing hashes identically across cycles and processes.
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Separates fields in the hash input so `("ab", "c")` and `("a", "bc")` differ
const FIELD_SEPARATOR: u8 = 0x1f;

/// Separates individual tags
const TAG_SEPARATOR: u8 = 0x1e;

/// Hex-encoded SHA-256 digest identifying one event
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps a digest previously produced by [`compute`], e.g. one read back from storage
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the fingerprint of an event from its identity-bearing fields
///
/// Tags are hashed in the order given; reordering them yields a different fingerprint.
///
/// # Example
///
/// ```
/// use event_relay::state::fingerprint;
///
/// let tags = vec!["Tech".to_string()];
/// let a = fingerprint::compute("Expo", "15/03/2025", "16/03/2025", "Hall 1", "N/A", &tags);
/// let b = fingerprint::compute("Expo", "15/03/2025", "16/03/2025", "Hall 1", "N/A", &tags);
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
pub fn compute(
    title: &str,
    start_date: &str,
    end_date: &str,
    venue: &str,
    description: &str,
    tags: &[String],
) -> Fingerprint {
    let mut hasher = Sha256::new();

    for field in [title, start_date, end_date, venue, description] {
        hasher.update(field.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
    }

    for tag in tags {
        hasher.update(tag.as_bytes());
        hasher.update([TAG_SEPARATOR]);
    }

    Fingerprint(hex::encode(hasher.finalize()))
}
