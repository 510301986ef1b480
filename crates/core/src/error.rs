//! Error taxonomy for the session token lifecycle.
//!
//! Every fallible operation of [`crate::service::SessionService`] returns a
//! [`CoreError`]. Storage and notification collaborators have their own
//! narrower error types which convert into it.

use crate::notifier::NotifierError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token is expired")]
    RefreshTokenExpired,

    #[error("The tokens were not issued together")]
    TokensNotPaired,

    #[error("User-agent has changed")]
    UserAgentChanged,

    #[error("Session is revoked")]
    SessionRevoked,

    #[error("Session not found or already revoked")]
    NotFoundOrAlreadyRevoked,

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Anomaly notifier unavailable: {0}")]
    NotifierUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the error means the caller has to authenticate again from
    /// scratch (as opposed to fixing its input or retrying later).
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            CoreError::Unauthenticated
                | CoreError::InvalidRefreshToken
                | CoreError::RefreshTokenExpired
                | CoreError::TokensNotPaired
                | CoreError::UserAgentChanged
                | CoreError::SessionRevoked
                | CoreError::NotFoundOrAlreadyRevoked
        )
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            // A missing row is indistinguishable from a dead session for callers.
            StoreError::NotFound => CoreError::SessionRevoked,
            StoreError::NotFoundOrAlreadyRevoked => CoreError::NotFoundOrAlreadyRevoked,
            StoreError::Unavailable(msg) => CoreError::StoreUnavailable(msg),
        }
    }
}

impl From<NotifierError> for CoreError {
    fn from(err: NotifierError) -> Self {
        CoreError::NotifierUnavailable(err.to_string())
    }
}
