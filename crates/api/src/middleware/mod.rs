//! Request extractors shared by the handlers.
//!
//! - [`auth::AuthSession`] -- Verified access-token claims from a Bearer token.
//! - [`client::ClientMeta`] -- Caller address and user-agent.

pub mod auth;
pub mod client;
