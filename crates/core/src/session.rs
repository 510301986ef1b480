//! The durable session record.

use std::net::IpAddr;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::types::{SessionId, Timestamp, UserId};

/// A server-side session binding a user, the hash of its current refresh
/// secret, and the client metadata recorded at issuance.
///
/// Sessions are never extended: rotation revokes the row and inserts a new
/// one with a fresh id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    /// Argon2id PHC string of the refresh secret. The raw secret is never kept.
    pub refresh_hash: String,
    pub user_agent: String,
    pub ip: IpAddr,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
}

impl Session {
    /// Build a fresh, non-revoked session starting now with a random id.
    pub fn new(
        user_id: UserId,
        refresh_hash: String,
        user_agent: &str,
        ip: IpAddr,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            refresh_hash,
            user_agent: user_agent.to_string(),
            ip,
            created_at: now,
            expires_at: now + ttl,
            is_revoked: false,
        }
    }

    /// Whether the session outlived its refresh window at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_active_with_forward_expiry() {
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let session = Session::new(Uuid::new_v4(), "hash".into(), "agent", ip, Duration::hours(48));

        assert!(!session.is_revoked);
        assert!(session.expires_at > session.created_at);
        assert_eq!(session.expires_at - session.created_at, Duration::hours(48));
        assert!(!session.is_expired_at(Utc::now()));
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let session = Session::new(Uuid::new_v4(), "hash".into(), "agent", ip, Duration::hours(1));

        assert!(!session.is_expired_at(session.expires_at));
        assert!(session.is_expired_at(session.expires_at + Duration::seconds(1)));
    }
}
