//! Record delivery to the ingestion API
//!
//! Each record is POSTed once with a bearer credential. Failures are logged and reported
//! as an outcome; they never abort the batch or the cycle.

use crate::config::IngestConfig;
use crate::output::EventRecord;
use crate::DeliveryError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The ingestion API accepted the record
    Delivered { status: u16 },

    /// The record was not accepted; it is not retried within this cycle
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Delivers one record at a time
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, record: &EventRecord) -> DeliveryOutcome;
}

/// Publishes records to the ingestion API over HTTP
pub struct HttpPublisher {
    client: Client,
    endpoint: String,
    token: String,
}

impl HttpPublisher {
    /// Creates a publisher from the ingest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpPublisher)` - Ready to deliver
    /// * `Err(reqwest::Error)` - Failed to build the HTTP client
    pub fn new(config: &IngestConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }

    /// Sends the record and returns the accepted status code
    async fn send(&self, record: &EventRecord) -> Result<u16, DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, record: &EventRecord) -> DeliveryOutcome {
        match self.send(record).await {
            Ok(status) => {
                tracing::info!(
                    event_id = %record.event_id,
                    status,
                    "Delivered event '{}'",
                    record.title
                );
                DeliveryOutcome::Delivered { status }
            }
            Err(e) => {
                tracing::error!(
                    event_id = %record.event_id,
                    "Failed to deliver event '{}': {}",
                    record.title,
                    e
                );
                DeliveryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
