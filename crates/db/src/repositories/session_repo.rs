//! Repository for the `sessions` table.

use passage_core::types::{SessionId, UserId};
use passage_core::Session;
use sqlx::{PgExecutor, PgPool};

use crate::models::session::SessionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, refresh_hash, user_agent, ip, created_at, expires_at, is_revoked";

/// Revokes a live row; matches nothing once the row is revoked.
const REVOKE: &str = "UPDATE sessions SET is_revoked = true WHERE id = $1 AND is_revoked = false";

/// Provides query operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a session, returning the stored row.
    pub async fn create(pool: &PgPool, session: &Session) -> Result<SessionRow, sqlx::Error> {
        Self::insert(pool, session).await
    }

    /// Find a session by id, revoked or not.
    pub async fn find_by_id(
        pool: &PgPool,
        id: SessionId,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a single session. Returns `true` if a live row was updated.
    pub async fn revoke(pool: &PgPool, id: SessionId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(REVOKE).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// All sessions that are not revoked, oldest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<SessionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions WHERE is_revoked = false ORDER BY created_at"
        );
        sqlx::query_as::<_, SessionRow>(&query).fetch_all(pool).await
    }

    /// Sessions of one user that are not revoked, newest first.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<SessionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE user_id = $1 AND is_revoked = false
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Revoke `old_id` and insert `new` in one transaction.
    ///
    /// Returns `Ok(None)` without inserting when `old_id` is missing or was
    /// already revoked. A concurrent rotation of the same row blocks on the
    /// row lock and then matches nothing, so only one caller can win. Any
    /// error drops the transaction, which rolls it back.
    pub async fn rotate(
        pool: &PgPool,
        old_id: SessionId,
        new: &Session,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let revoked = sqlx::query(REVOKE).bind(old_id).execute(&mut *tx).await?;
        if revoked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = Self::insert(&mut *tx, new).await?;
        tx.commit().await?;

        Ok(Some(row))
    }

    async fn insert<'e, E>(executor: E, session: &Session) -> Result<SessionRow, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO sessions (id, user_id, refresh_hash, user_agent, ip, created_at, expires_at, is_revoked)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(session.id)
            .bind(session.user_id)
            .bind(&session.refresh_hash)
            .bind(&session.user_agent)
            .bind(session.ip.to_string())
            .bind(session.created_at)
            .bind(session.expires_at)
            .bind(session.is_revoked)
            .fetch_one(executor)
            .await
    }
}
