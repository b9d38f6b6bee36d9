//! Page rendering capability
//!
//! This module handles obtaining a ready document for a source URL:
//! - The `Renderer` trait the pipeline depends on
//! - An HTTP-backed implementation that polls until the readiness selector appears
//! - Building HTTP sessions that carry the configured client identity

use crate::config::RenderConfig;
use crate::crawler::extractor::excerpt;
use crate::RenderError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

/// A fully rendered page
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// The URL the document was rendered from
    pub url: String,

    /// Document markup after dynamic content has loaded
    pub html: String,
}

/// Produces a rendered document for a URL once `readiness_selector` matches
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        url: &str,
        readiness_selector: &str,
        timeout: Duration,
    ) -> Result<RenderedDocument, RenderError>;
}

/// Renders pages by fetching them over HTTP until the readiness selector matches
///
/// Every call opens a fresh session; nothing is pooled between renders.
pub struct HttpRenderer {
    user_agent: String,
    poll_interval: Duration,
}

impl HttpRenderer {
    /// Creates a renderer from the render configuration
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Fetches the page repeatedly until the readiness selector matches
    ///
    /// `last_body` holds the most recent copy that was not ready yet.
    async fn poll_until_ready(
        &self,
        client: &Client,
        url: &str,
        readiness: &Selector,
        last_body: &mut Option<String>,
    ) -> Result<String, RenderError> {
        loop {
            let html = fetch_page(client, url).await?;
            if is_ready(&html, readiness) {
                return Ok(html);
            }
            *last_body = Some(html);

            tracing::debug!(source = %url, "Readiness selector not present yet, polling again");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(
        &self,
        url: &str,
        readiness_selector: &str,
        timeout: Duration,
    ) -> Result<RenderedDocument, RenderError> {
        let readiness = Selector::parse(readiness_selector)
            .map_err(|e| RenderError::InvalidSelector(format!("{}: {}", readiness_selector, e)))?;

        let client = build_render_client(&self.user_agent, timeout).map_err(|source| {
            RenderError::Http {
                url: url.to_string(),
                source,
            }
        })?;

        let mut last_body = None;
        let polled = tokio::time::timeout(
            timeout,
            self.poll_until_ready(&client, url, &readiness, &mut last_body),
        )
        .await;

        let html = match polled {
            Ok(result) => result?,
            Err(_) => {
                let last_excerpt = last_body.as_deref().map(excerpt);
                tracing::warn!(
                    source = %url,
                    excerpt = %last_excerpt.as_deref().unwrap_or(""),
                    "Readiness selector '{}' never appeared; site structure may have changed",
                    readiness_selector
                );
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    secs: timeout.as_secs(),
                    last_excerpt,
                });
            }
        };

        Ok(RenderedDocument {
            url: url.to_string(),
            html,
        })
    }
}

/// Builds an HTTP session that presents the configured client identity
///
/// # Arguments
///
/// * `user_agent` - The client identity string
/// * `timeout` - Upper bound on any single request
pub fn build_render_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one copy of the page body
async fn fetch_page(client: &Client, url: &str) -> Result<String, RenderError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| RenderError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RenderError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| RenderError::Http {
        url: url.to_string(),
        source,
    })
}

fn is_ready(html: &str, readiness: &Selector) -> bool {
    Html::parse_document(html).select(readiness).next().is_some()
}
