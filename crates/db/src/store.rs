//! [`SessionStore`] backed by Postgres.

use async_trait::async_trait;
use passage_core::store::{SessionStore, StoreError};
use passage_core::types::{SessionId, UserId};
use passage_core::Session;

use crate::models::session::SessionRow;
use crate::repositories::SessionRepo;
use crate::DbPool;

#[derive(Clone)]
pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Session store query failed");
    StoreError::Unavailable(err.to_string())
}

fn to_session(row: SessionRow) -> Result<Session, StoreError> {
    Session::try_from(row).map_err(|e| {
        tracing::error!(error = %e, "Corrupt session row");
        StoreError::Unavailable(e.to_string())
    })
}

fn to_sessions(rows: Vec<SessionRow>) -> Result<Vec<Session>, StoreError> {
    rows.into_iter().map(to_session).collect()
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: &Session) -> Result<SessionId, StoreError> {
        let row = SessionRepo::create(&self.pool, session)
            .await
            .map_err(unavailable)?;
        Ok(row.id)
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Session, StoreError> {
        let row = SessionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(unavailable)?
            .ok_or(StoreError::NotFound)?;
        to_session(row)
    }

    async fn revoke(&self, id: SessionId) -> Result<(), StoreError> {
        let updated = SessionRepo::revoke(&self.pool, id)
            .await
            .map_err(unavailable)?;
        if !updated {
            return Err(StoreError::NotFoundOrAlreadyRevoked);
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<Session>, StoreError> {
        let rows = SessionRepo::list_active(&self.pool)
            .await
            .map_err(unavailable)?;
        to_sessions(rows)
    }

    async fn list_active_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError> {
        let rows = SessionRepo::list_active_for_user(&self.pool, user_id)
            .await
            .map_err(unavailable)?;
        to_sessions(rows)
    }

    async fn rotate(&self, old: &Session, new: &Session) -> Result<SessionId, StoreError> {
        let row = SessionRepo::rotate(&self.pool, old.id, new)
            .await
            .map_err(unavailable)?
            .ok_or(StoreError::NotFoundOrAlreadyRevoked)?;
        Ok(row.id)
    }
}
