//! Access-token signing and verification.
//!
//! Access tokens are HMAC-signed JWTs carrying [`AccessClaims`]. They are
//! self-contained: verification never touches the session store.

use std::fmt;
use std::net::IpAddr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::SessionId;

pub use jsonwebtoken::Algorithm;

/// Default access token lifetime in minutes.
pub const DEFAULT_ACCESS_TTL_MINS: i64 = 15;
/// Default refresh token (session) lifetime in hours.
pub const DEFAULT_REFRESH_TTL_HOURS: i64 = 48;

/// The only algorithms accepted on verification. Anything outside the HMAC
/// family (`none`, RSA, EC) is rejected before the signature is looked at.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// The session this token was minted for.
    pub session_id: SessionId,
    /// Client user-agent at the moment the token was minted.
    pub user_agent: String,
    /// Client address at the moment the token was minted.
    pub ip: IpAddr,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Signing key and lifetimes for the token pair.
///
/// Built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct TokenConfig {
    /// Server-held HMAC secret.
    pub signing_key: String,
    /// HMAC variant used when signing (default: HS512).
    pub algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl TokenConfig {
    /// Config with the default algorithm and lifetimes.
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: signing_key.into(),
            algorithm: Algorithm::HS512,
            access_token_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINS),
            refresh_token_ttl: Duration::hours(DEFAULT_REFRESH_TTL_HOURS),
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

/// Parse an HMAC algorithm name (`HS256`, `HS384`, `HS512`).
///
/// Returns `None` for anything else, including asymmetric algorithms.
pub fn hmac_algorithm(name: &str) -> Option<Algorithm> {
    HMAC_ALGORITHMS
        .into_iter()
        .find(|alg| format!("{alg:?}").eq_ignore_ascii_case(name.trim()))
}

/// Sign an access token for `session_id`, snapshotting the client metadata.
pub fn sign_access_token(
    session_id: SessionId,
    user_agent: &str,
    ip: IpAddr,
    config: &TokenConfig,
) -> Result<String, CoreError> {
    if !HMAC_ALGORITHMS.contains(&config.algorithm) {
        return Err(CoreError::Internal(format!(
            "Signing algorithm {:?} is not an HMAC algorithm",
            config.algorithm
        )));
    }

    let now = Utc::now();
    let claims = AccessClaims {
        session_id,
        user_agent: user_agent.to_string(),
        ip,
        iat: now.timestamp(),
        exp: (now + config.access_token_ttl).timestamp(),
    };

    encode(
        &Header::new(config.algorithm),
        &claims,
        &EncodingKey::from_secret(config.signing_key.as_bytes()),
    )
    .map_err(|e| CoreError::Internal(format!("Token signing error: {e}")))
}

/// Validate an access token and return its claims.
///
/// Malformed tokens, foreign algorithms, bad signatures and expired tokens
/// all collapse into [`CoreError::Unauthenticated`].
pub fn verify_access_token(token: &str, config: &TokenConfig) -> Result<AccessClaims, CoreError> {
    let mut validation = Validation::new(config.algorithm);
    validation.algorithms = HMAC_ALGORITHMS.to_vec();

    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.signing_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        CoreError::Unauthenticated
    })
}
