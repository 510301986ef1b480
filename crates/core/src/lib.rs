//! Passage session token lifecycle.
//!
//! - [`service`] -- issuance, verification, refresh rotation, revocation.
//! - [`token`] -- HMAC-signed access tokens and their claims.
//! - [`refresh_secret`] -- refresh secret generation, encoding, Argon2id hashing.
//! - [`store`] -- the session store capability, with [`memory`] as an in-process implementation.
//! - [`notifier`] -- the anomaly notifier capability.

pub mod error;
pub mod memory;
pub mod notifier;
pub mod refresh_secret;
pub mod service;
pub mod session;
pub mod store;
pub mod token;
pub mod types;

pub use error::CoreError;
pub use service::{SessionService, TokenPair};
pub use session::Session;
