//! Webhook delivery of anomaly notifications.
//!
//! [`WebhookNotifier`] POSTs a JSON [`AnomalyPayload`] to a fixed URL. By
//! default a single attempt is made; optional retry delays re-send after a
//! failure before giving up.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use passage_core::notifier::{AnomalyNotifier, NotifierError};
use serde::Serialize;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `User-Agent` sent with every delivery.
const USER_AGENT: &str = "passage-auth";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// JSON body of a delivery.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyPayload {
    pub event: String,
    pub message: String,
    /// RFC 3339 send time.
    pub sent_at: String,
}

impl AnomalyPayload {
    pub fn new(event: &str, message: &str) -> Self {
        Self {
            event: event.to_string(),
            message: message.to_string(),
            sent_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers anomaly notifications to an external webhook endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    retry_delays: Vec<Duration>,
}

impl WebhookNotifier {
    /// Create a notifier for `url` with a pre-configured HTTP client.
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_delays: Vec::new(),
        })
    }

    /// Retry after each of `delays` when an attempt fails.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver a payload, retrying per the configured delays.
    ///
    /// Returns `Ok(())` on the first successful attempt and the last error
    /// once every attempt has failed.
    pub async fn deliver(&self, payload: &AnomalyPayload) -> Result<(), WebhookError> {
        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %self.url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        self.try_send(payload).await.inspect_err(|e| {
            tracing::error!(url = %self.url, error = %e, "Webhook delivery failed");
        })
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, payload: &AnomalyPayload) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl AnomalyNotifier for WebhookNotifier {
    async fn notify(&self, event: &str, message: &str) -> Result<(), NotifierError> {
        self.deliver(&AnomalyPayload::new(event, message))
            .await
            .map_err(|e| NotifierError(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
