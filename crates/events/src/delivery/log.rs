//! Log-only anomaly notifier for deployments without a webhook.

use async_trait::async_trait;
use passage_core::notifier::{AnomalyNotifier, NotifierError};

/// Records anomalies in the service log and never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl AnomalyNotifier for LogNotifier {
    async fn notify(&self, event: &str, message: &str) -> Result<(), NotifierError> {
        tracing::warn!(event, detail = %message, "Session anomaly");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_succeeds() {
        assert!(LogNotifier.notify("wrong ip", "msg").await.is_ok());
    }
}
