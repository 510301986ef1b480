//! Session token lifecycle: issuance, verification, rotation, revocation.
//!
//! [`SessionService`] is the orchestrator the transport layer talks to. It
//! owns the signing configuration and the refresh hasher, and reaches the
//! session store and the anomaly notifier through their capability traits.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;

use crate::error::CoreError;
use crate::notifier::{AnomalyNotifier, EVENT_WRONG_IP};
use crate::refresh_secret::{RefreshHasher, RefreshSecret};
use crate::session::Session;
use crate::store::{SessionStore, StoreError};
use crate::token::{sign_access_token, verify_access_token, AccessClaims, TokenConfig};
use crate::types::{SessionId, UserId};

/// A freshly minted access token plus the transport form of its refresh
/// secret. The secret exists nowhere else once this value is dropped.
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

pub struct SessionService {
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn AnomalyNotifier>,
    tokens: TokenConfig,
    hasher: RefreshHasher,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn AnomalyNotifier>,
        tokens: TokenConfig,
        hasher: RefreshHasher,
    ) -> Self {
        Self {
            store,
            notifier,
            tokens,
            hasher,
        }
    }

    pub fn token_config(&self) -> &TokenConfig {
        &self.tokens
    }

    // -----------------------------------------------------------------------
    // Issuance
    // -----------------------------------------------------------------------

    /// Mint a token pair for an already-known user and persist its session.
    ///
    /// Nothing is returned unless the session row was written.
    pub async fn issue_tokens(
        &self,
        user_id: UserId,
        user_agent: &str,
        client_ip: IpAddr,
    ) -> Result<TokenPair, CoreError> {
        let (session, secret) = self.mint_session(user_id, user_agent, client_ip).await?;
        let access_token = sign_access_token(session.id, user_agent, client_ip, &self.tokens)?;

        self.store.create(&session).await?;
        tracing::info!(session_id = %session.id, %user_id, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token: secret.encode(),
        })
    }

    /// Stateless access-token verification.
    pub fn parse_access_token(&self, token: &str) -> Result<AccessClaims, CoreError> {
        verify_access_token(token, &self.tokens)
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Resolve the live session an access token points at.
    pub async fn get_session(&self, claims: &AccessClaims) -> Result<Session, CoreError> {
        let session = self.store.get_by_id(claims.session_id).await?;
        if session.is_revoked {
            return Err(CoreError::SessionRevoked);
        }
        Ok(session)
    }

    /// Unexpired, unrevoked sessions of the caller's user.
    pub async fn list_user_sessions(
        &self,
        claims: &AccessClaims,
    ) -> Result<Vec<Session>, CoreError> {
        let current = self.get_session(claims).await?;
        let now = Utc::now();

        let mut sessions: Vec<Session> = self
            .store
            .list_active_for_user(current.user_id)
            .await?
            .into_iter()
            .filter(|s| !s.is_expired_at(now))
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    // -----------------------------------------------------------------------
    // Revocation
    // -----------------------------------------------------------------------

    pub async fn revoke(&self, session_id: SessionId) -> Result<(), CoreError> {
        self.store.revoke(session_id).await?;
        tracing::info!(%session_id, "Session revoked");
        Ok(())
    }

    /// Revoke every live session of the caller's user, returning the count.
    ///
    /// Sessions revoked concurrently by another request are skipped.
    pub async fn revoke_all_for_user(&self, claims: &AccessClaims) -> Result<u64, CoreError> {
        let current = self.get_session(claims).await?;
        let sessions = self.store.list_active_for_user(current.user_id).await?;

        let mut revoked = 0;
        for session in sessions {
            match self.store.revoke(session.id).await {
                Ok(()) => revoked += 1,
                Err(StoreError::NotFoundOrAlreadyRevoked) => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(user_id = %current.user_id, revoked, "Revoked all sessions for user");
        Ok(revoked)
    }

    // -----------------------------------------------------------------------
    // Rotation
    // -----------------------------------------------------------------------

    /// Exchange an access token and its paired refresh secret for a new pair.
    ///
    /// A user-agent change revokes the session and fails. An address change
    /// only raises an anomaly notification, but a failing notifier fails the
    /// refresh. The old session is revoked and the new one inserted in a
    /// single store transaction.
    pub async fn refresh(
        &self,
        claims: &AccessClaims,
        refresh_token: &str,
        user_agent: &str,
        client_ip: IpAddr,
    ) -> Result<TokenPair, CoreError> {
        let secret = RefreshSecret::decode(refresh_token)?;

        let active = self.store.list_active().await?;
        let session = self
            .find_session(secret, active)
            .await?
            .ok_or(CoreError::InvalidRefreshToken)?;

        if session.is_expired_at(Utc::now()) {
            tracing::warn!(session_id = %session.id, "Refresh with expired session");
            return Err(CoreError::RefreshTokenExpired);
        }

        if session.id != claims.session_id {
            tracing::warn!(
                session_id = %session.id,
                claimed_session_id = %claims.session_id,
                "Access and refresh tokens belong to different sessions"
            );
            return Err(CoreError::TokensNotPaired);
        }

        if user_agent != session.user_agent || user_agent != claims.user_agent {
            tracing::warn!(
                session_id = %session.id,
                expected = %session.user_agent,
                received = %user_agent,
                "User-agent changed, revoking session"
            );
            match self.store.revoke(session.id).await {
                // Lost a race with another revocation; the session is dead either way.
                Ok(()) | Err(StoreError::NotFoundOrAlreadyRevoked) => {}
                Err(e) => return Err(e.into()),
            }
            return Err(CoreError::UserAgentChanged);
        }

        self.report_address_change(&session, claims, client_ip)
            .await?;

        let (next, next_secret) = self
            .mint_session(session.user_id, user_agent, client_ip)
            .await?;
        let access_token = sign_access_token(next.id, user_agent, client_ip, &self.tokens)?;

        match self.store.rotate(&session, &next).await {
            Ok(_) => {}
            Err(StoreError::NotFoundOrAlreadyRevoked) => {
                tracing::warn!(session_id = %session.id, "Refresh lost rotation race");
                return Err(CoreError::InvalidRefreshToken);
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            old_session_id = %session.id,
            new_session_id = %next.id,
            user_id = %session.user_id,
            "Rotated session"
        );

        Ok(TokenPair {
            access_token,
            refresh_token: next_secret.encode(),
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Notify once per recorded address that differs from `client_ip`.
    async fn report_address_change(
        &self,
        session: &Session,
        claims: &AccessClaims,
        client_ip: IpAddr,
    ) -> Result<(), CoreError> {
        let mut expected = vec![session.ip];
        if claims.ip != session.ip {
            expected.push(claims.ip);
        }

        for ip in expected.into_iter().filter(|ip| *ip != client_ip) {
            tracing::warn!(
                session_id = %session.id,
                expected = %ip,
                received = %client_ip,
                "Refresh from unexpected address"
            );
            let message = format!("received ip {client_ip}, expected {ip}");
            self.notifier.notify(EVENT_WRONG_IP, &message).await?;
        }
        Ok(())
    }

    /// Generate a secret, hash it off the async runtime, and build the row.
    async fn mint_session(
        &self,
        user_id: UserId,
        user_agent: &str,
        client_ip: IpAddr,
    ) -> Result<(Session, RefreshSecret), CoreError> {
        let secret = RefreshSecret::generate();
        let hasher = self.hasher.clone();
        let to_hash = secret.clone();

        let refresh_hash = tokio::task::spawn_blocking(move || hasher.hash(&to_hash))
            .await
            .map_err(|e| CoreError::Internal(format!("Hashing task failed: {e}")))??;

        let session = Session::new(
            user_id,
            refresh_hash,
            user_agent,
            client_ip,
            self.tokens.refresh_token_ttl,
        );
        Ok((session, secret))
    }

    /// Scan `candidates` for the session owning `secret` off the async runtime.
    async fn find_session(
        &self,
        secret: RefreshSecret,
        candidates: Vec<Session>,
    ) -> Result<Option<Session>, CoreError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.find_match(&secret, candidates))
            .await
            .map_err(|e| CoreError::Internal(format!("Hash scan task failed: {e}")))
    }
}
