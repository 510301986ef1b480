//! Passage anomaly notification channels.
//!
//! - [`WebhookNotifier`] -- JSON POST to a configured endpoint.
//! - [`LogNotifier`] -- structured log line only.

pub mod delivery;

pub use delivery::log::LogNotifier;
pub use delivery::webhook::{AnomalyPayload, WebhookError, WebhookNotifier};
