//! In-process [`SessionStore`] backed by a locked map.
//!
//! Used by tests and by local tooling that has no database. Every operation
//! takes the write lock at most once, which makes `rotate` atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::session::Session;
use crate::store::{SessionStore, StoreError};
use crate::types::SessionId;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows, revoked ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Overwrite a stored row in place. Test hook for states the protocol
    /// never produces on its own, like a session that expired in the past.
    pub async fn replace(&self, session: Session) {
        self.sessions.write().await.insert(session.id, session);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: &Session) -> Result<SessionId, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Unavailable(format!(
                "duplicate session id {}",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(session.id)
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Session, StoreError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn revoke(&self, id: SessionId) -> Result<(), StoreError> {
        match self.sessions.write().await.get_mut(&id) {
            Some(session) if !session.is_revoked => {
                session.is_revoked = true;
                Ok(())
            }
            _ => Err(StoreError::NotFoundOrAlreadyRevoked),
        }
    }

    async fn list_active(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_revoked)
            .cloned()
            .collect())
    }

    async fn rotate(&self, old: &Session, new: &Session) -> Result<SessionId, StoreError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&new.id) {
            return Err(StoreError::Unavailable(format!(
                "duplicate session id {}",
                new.id
            )));
        }
        match sessions.get_mut(&old.id) {
            Some(current) if !current.is_revoked => current.is_revoked = true,
            _ => return Err(StoreError::NotFoundOrAlreadyRevoked),
        }
        sessions.insert(new.id, new.clone());

        Ok(new.id)
    }
}
