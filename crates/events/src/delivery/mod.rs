//! External delivery channels for anomaly notifications.

pub mod log;
pub mod webhook;
