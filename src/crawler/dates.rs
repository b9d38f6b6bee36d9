//! Date normalization for source-native listing dates
//!
//! Listing pages carry dates as three slash-separated numeric components. They are
//! rewritten into a midnight-UTC timestamp string, keeping the component order the site
//! uses. No calendar validation is done.

use crate::crawler::extractor::SENTINEL;

/// Converts a `a/b/c` date into `a-b-cT00:00:00Z`
///
/// Returns [`SENTINEL`] for the sentinel itself and for anything that is not exactly
/// three non-empty numeric components.
///
/// # Example
///
/// ```
/// use event_relay::crawler::normalize_date;
///
/// assert_eq!(normalize_date("15/03/2025"), "15-03-2025T00:00:00Z");
/// assert_eq!(normalize_date("N/A"), "N/A");
/// assert_eq!(normalize_date("15/03"), "N/A");
/// ```
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw == SENTINEL {
        return SENTINEL.to_string();
    }

    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return SENTINEL.to_string();
    }

    let numeric = parts
        .iter()
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !numeric {
        return SENTINEL.to_string();
    }

    format!("{}T00:00:00Z", parts.join("-"))
}
