//! Event row extraction from rendered listing pages
//!
//! This module turns a rendered document into raw event candidates:
//! - Locates event rows by their row-marker class
//! - Resolves each field through an ordered list of selector alternatives
//! - Substitutes the sentinel for fields no alternative matches
//! - Drops rows that carry no event data at all (ads, spacers)
//!
//! Markup drift never raises. A page with no rows yields an empty batch and a warning
//! carrying a document excerpt. A field that cannot be resolved never fails its row.

use crate::state::{fingerprint, Fingerprint};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Placeholder for any field no selector could resolve
pub const SENTINEL: &str = "N/A";

/// Marks one event row; also used as the renderer's readiness selector
pub const ROW_MARKER: &str = "tr[class*='deep-shadow']";

const TITLE_SELECTORS: &[&str] = &[".fw-bold a", "h2", ".d-block.fw-bold span"];
const IMAGE_SELECTOR: &str = "img.rounded-3";
const EVENT_TIME_SELECTOR: &str = "div.eventTime";
const VENUE_SELECTORS: &[&str] = &["span.fw-600", "td.text-muted-new"];
const DESCRIPTION_SELECTORS: &[&str] = &[".text-wrap", ".small.text-muted", "p"];
const TAG_SELECTOR: &str = ".badge, span.label";

/// Characters of markup included in drift and skip diagnostics
const EXCERPT_LEN: usize = 500;

/// Errors raised while setting up or running extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// One unvalidated event row as it appeared on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: String,
    pub image_url: String,
    pub start_date_raw: String,
    pub end_date_raw: String,
    pub display_date_text: String,
    pub venue: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl RawCandidate {
    /// True for rows with no title, date text, or venue
    pub fn is_non_event(&self) -> bool {
        self.title == SENTINEL && self.display_date_text == SENTINEL && self.venue == SENTINEL
    }

    /// Content fingerprint over the identity-bearing fields
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint::compute(
            &self.title,
            &self.start_date_raw,
            &self.end_date_raw,
            &self.venue,
            &self.description,
            &self.tags,
        )
    }
}

/// Compiled selectors for the event listing markup
pub struct Extractor {
    row: Selector,
    title: Vec<Selector>,
    image: Selector,
    event_time: Selector,
    venue: Vec<Selector>,
    description: Vec<Selector>,
    tags: Selector,
}

impl Extractor {
    /// Compiles the listing selectors
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            row: compile(ROW_MARKER)?,
            title: compile_all(TITLE_SELECTORS)?,
            image: compile(IMAGE_SELECTOR)?,
            event_time: compile(EVENT_TIME_SELECTOR)?,
            venue: compile_all(VENUE_SELECTORS)?,
            description: compile_all(DESCRIPTION_SELECTORS)?,
            tags: compile(TAG_SELECTOR)?,
        })
    }

    /// Extracts up to `max` candidates from a rendered document, in document order
    ///
    /// Non-event rows are skipped and do not count toward `max`.
    ///
    /// # Arguments
    ///
    /// * `html` - The rendered document
    /// * `source_url` - The page URL, used for logging and resolving image links
    /// * `max` - Maximum number of candidates to return
    pub fn extract(&self, html: &str, source_url: &str, max: usize) -> Vec<RawCandidate> {
        let document = Html::parse_document(html);
        let base = Url::parse(source_url).ok();

        let rows: Vec<ElementRef> = document.select(&self.row).collect();
        if rows.is_empty() {
            tracing::warn!(
                source = %source_url,
                excerpt = %excerpt(html),
                "No event rows found; site structure may have changed"
            );
            return Vec::new();
        }

        tracing::info!(source = %source_url, rows = rows.len(), "Found event rows, extracting details");

        let mut candidates = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            if candidates.len() >= max {
                break;
            }

            let candidate = self.extract_row(row, base.as_ref());
            if candidate.is_non_event() {
                tracing::debug!(
                    source = %source_url,
                    index,
                    row = %excerpt(&row.html()),
                    "Skipping row with no event data"
                );
                continue;
            }

            candidates.push(candidate);
        }

        if candidates.is_empty() {
            tracing::info!(source = %source_url, "No valid events extracted");
        }

        candidates
    }

    /// Resolves every field of one row, falling back to the sentinel per field
    fn extract_row(&self, row: ElementRef, base: Option<&Url>) -> RawCandidate {
        let title = first_text(row, &self.title).unwrap_or_else(sentinel);
        let image_url = self.image_url(row, base);

        let (start_date_raw, end_date_raw, display_date_text) =
            match row.select(&self.event_time).next() {
                Some(time) => (
                    non_empty_attr(time, "data-start-date").unwrap_or_else(sentinel),
                    non_empty_attr(time, "data-end-date").unwrap_or_else(sentinel),
                    element_text(time).unwrap_or_else(sentinel),
                ),
                None => (sentinel(), sentinel(), sentinel()),
            };

        let venue = first_text(row, &self.venue).unwrap_or_else(sentinel);
        let description = first_text(row, &self.description).unwrap_or_else(sentinel);
        let tags = row.select(&self.tags).filter_map(element_text).collect();

        RawCandidate {
            title,
            image_url,
            start_date_raw,
            end_date_raw,
            display_date_text,
            venue,
            description,
            tags,
        }
    }

    /// Image link resolved against the page URL, or the raw `src` if it will not resolve
    fn image_url(&self, row: ElementRef, base: Option<&Url>) -> String {
        let Some(src) = row
            .select(&self.image)
            .next()
            .and_then(|img| non_empty_attr(img, "src"))
        else {
            return sentinel();
        };

        let resolved = match base {
            Some(base) => base.join(&src),
            None => Url::parse(&src),
        };

        match resolved {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!(src = %src, "Keeping unresolvable image link as-is: {}", e);
                src
            }
        }
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn compile_all(selectors: &[&str]) -> Result<Vec<Selector>, ExtractError> {
    selectors.iter().map(|s| compile(s)).collect()
}

fn sentinel() -> String {
    SENTINEL.to_string()
}

/// Text of the first alternative that matches with non-empty text
fn first_text(row: ElementRef, alternatives: &[Selector]) -> Option<String> {
    alternatives
        .iter()
        .find_map(|selector| row.select(selector).find_map(element_text))
}

/// Whitespace-collapsed text content, or None if blank
fn element_text(element: ElementRef) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn non_empty_attr(element: ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First characters of `markup`, for diagnostics
pub(crate) fn excerpt(markup: &str) -> String {
    markup.chars().take(EXCERPT_LEN).collect()
}
