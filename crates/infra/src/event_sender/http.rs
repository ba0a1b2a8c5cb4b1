//! HTTP event sender (CloudEvents structured mode).
//!
//! Posts each envelope as `application/cloudevents+json` to the event broker.
//! - **One attempt**: no retries; the caller sees every failure
//! - **Shared client**: one connection pool for all concurrent invocations
//! - Any 2xx answer counts as accepted

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::instrument;

use k6svc_core::ServiceConfig;
use k6svc_events::{Envelope, EventSender, SendError};

/// Content type of structured-mode CloudEvents.
pub const CLOUDEVENTS_JSON: &str = "application/cloudevents+json";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpEventSender {
    client: reqwest::Client,
    url: String,
}

impl HttpEventSender {
    /// Create a sender posting to `url`, giving up on a request after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Sender for the configured event broker.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, SendError> {
        Self::new(config.event_broker_url.clone(), DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl EventSender for HttpEventSender {
    #[instrument(
        skip(self, envelope),
        fields(
            url = %self.url,
            event_type = %envelope.event_type(),
            event_id = %envelope.id(),
        )
    )]
    async fn send(&self, envelope: Envelope) -> Result<(), SendError> {
        let body = envelope
            .encode()
            .map_err(|e| SendError::Transport(format!("encode: {e}")))?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, CLOUDEVENTS_JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(SendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
