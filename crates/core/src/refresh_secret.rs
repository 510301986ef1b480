//! Refresh secrets: generation, transport encoding, and Argon2id hashing.
//!
//! A refresh secret is 32 random bytes handed to the client once as URL-safe
//! unpadded base64. Only an Argon2id PHC string of the raw bytes is stored,
//! so a database leak does not let anyone mint new token pairs.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

use crate::error::CoreError;
use crate::session::Session;

/// Length of a raw refresh secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Length of the random Argon2 salt in bytes.
const SALT_LEN: usize = 16;

/// A raw refresh secret. Exists only between generation and the response,
/// or between request decoding and hash comparison.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshSecret([u8; SECRET_LEN]);

impl RefreshSecret {
    /// Draw a new secret from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Decode the transport form. Anything that is not exactly
    /// [`SECRET_LEN`] bytes of URL-safe unpadded base64 is rejected.
    pub fn decode(encoded: &str) -> Result<Self, CoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| CoreError::InvalidRequest(format!("Malformed refresh token: {e}")))?;

        let bytes: [u8; SECRET_LEN] = bytes.try_into().map_err(|_| {
            CoreError::InvalidRequest(format!("Refresh token must encode {SECRET_LEN} bytes"))
        })?;

        Ok(Self(bytes))
    }

    /// URL-safe, unpadded base64 transport form.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RefreshSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshSecret(<redacted>)")
    }
}

/// Argon2id hasher for refresh secrets with a tunable cost.
#[derive(Debug, Clone)]
pub struct RefreshHasher {
    params: Params,
}

impl Default for RefreshHasher {
    /// The argon2 crate's defaults: 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl RefreshHasher {
    /// Build a hasher with explicit memory (KiB), pass and lane counts.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, CoreError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| CoreError::Internal(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a secret with a fresh random salt into a PHC string.
    pub fn hash(&self, secret: &RefreshSecret) -> Result<String, CoreError> {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| CoreError::Internal(format!("Salt encoding error: {e}")))?;
        let hash = self
            .argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| CoreError::Internal(format!("Refresh secret hashing error: {e}")))?;
        Ok(hash.to_string())
    }

    /// Constant-time check of `secret` against a stored PHC string.
    ///
    /// The cost parameters are read from the stored hash, so sessions hashed
    /// under older settings keep verifying. An unparseable hash never matches.
    pub fn verify(&self, secret: &RefreshSecret, phc: &str) -> bool {
        let parsed = match PasswordHash::new(phc) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored refresh hash is not a valid PHC string");
                return false;
            }
        };
        self.argon2()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    /// Linear scan for the first session whose hash matches `secret`.
    pub fn find_match(&self, secret: &RefreshSecret, sessions: Vec<Session>) -> Option<Session> {
        sessions
            .into_iter()
            .find(|session| self.verify(secret, &session.refresh_hash))
    }
}
