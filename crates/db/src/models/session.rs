//! Session row model.

use std::net::IpAddr;

use passage_core::types::{SessionId, Timestamp, UserId};
use passage_core::Session;
use sqlx::FromRow;

/// A row from the `sessions` table.
///
/// The client address is stored as text and parsed back into an
/// [`IpAddr`] when converting to the domain [`Session`].
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: SessionId,
    pub user_id: UserId,
    pub refresh_hash: String,
    pub user_agent: String,
    pub ip: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
}

/// The stored address of a row could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("Session {id} has an invalid ip column: {value}")]
pub struct InvalidIpColumn {
    pub id: SessionId,
    pub value: String,
}

impl TryFrom<SessionRow> for Session {
    type Error = InvalidIpColumn;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let ip: IpAddr = row.ip.parse().map_err(|_| InvalidIpColumn {
            id: row.id,
            value: row.ip.clone(),
        })?;

        Ok(Session {
            id: row.id,
            user_id: row.user_id,
            refresh_hash: row.refresh_hash,
            user_agent: row.user_agent,
            ip,
            created_at: row.created_at,
            expires_at: row.expires_at,
            is_revoked: row.is_revoked,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn row(ip: &str) -> SessionRow {
        let now = Utc::now();
        SessionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refresh_hash: "$argon2id$stub".into(),
            user_agent: "agent".into(),
            ip: ip.into(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
            is_revoked: false,
        }
    }

    #[test]
    fn converts_v4_and_v6_rows() {
        let v4 = Session::try_from(row("1.2.3.4")).unwrap();
        assert_eq!(v4.ip, "1.2.3.4".parse::<IpAddr>().unwrap());

        let v6 = Session::try_from(row("2001:db8::1")).unwrap();
        assert!(v6.ip.is_ipv6());
    }

    #[test]
    fn rejects_unparseable_ip() {
        let err = Session::try_from(row("not-an-ip")).unwrap_err();
        assert_eq!(err.value, "not-an-ip");
    }
}
