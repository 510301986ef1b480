//! Session store capability.
//!
//! The protocol in [`crate::service`] only talks to sessions through
//! [`SessionStore`], so the Postgres store and the in-memory store are
//! interchangeable.

use async_trait::async_trait;

use crate::session::Session;
use crate::types::{SessionId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session not found")]
    NotFound,

    #[error("Session not found or already revoked")]
    NotFoundOrAlreadyRevoked,

    /// Connection, query, or transaction failure in the backing store.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of sessions keyed by session id.
///
/// Sessions are never deleted through this interface. Revoked rows stay
/// behind for audit.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session, returning its id.
    async fn create(&self, session: &Session) -> Result<SessionId, StoreError>;

    /// Fetch a session regardless of its revocation state.
    async fn get_by_id(&self, id: SessionId) -> Result<Session, StoreError>;

    /// Mark a live session revoked.
    ///
    /// Fails with [`StoreError::NotFoundOrAlreadyRevoked`] when no live row
    /// with that id exists.
    async fn revoke(&self, id: SessionId) -> Result<(), StoreError>;

    /// All sessions that are not revoked (expired ones included).
    async fn list_active(&self) -> Result<Vec<Session>, StoreError>;

    /// Active sessions belonging to one user.
    async fn list_active_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError> {
        let sessions = self.list_active().await?;
        Ok(sessions
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .collect())
    }

    /// Atomically revoke `old` and insert `new`.
    ///
    /// If `old` was already revoked (for example by a concurrent rotation)
    /// this fails with [`StoreError::NotFoundOrAlreadyRevoked`] and `new` is
    /// not inserted. On any failure neither change is visible.
    async fn rotate(&self, old: &Session, new: &Session) -> Result<SessionId, StoreError>;
}
