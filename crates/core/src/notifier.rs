//! Anomaly notification capability.

use async_trait::async_trait;

/// Event name sent when a refresh arrives from an unexpected address.
pub const EVENT_WRONG_IP: &str = "wrong ip";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct NotifierError(pub String);

/// Alert channel for client-metadata anomalies.
///
/// Called inline by the refresh protocol; an error fails the refresh.
#[async_trait]
pub trait AnomalyNotifier: Send + Sync {
    async fn notify(&self, event: &str, message: &str) -> Result<(), NotifierError>;
}
