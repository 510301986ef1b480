use std::str::FromStr;

use axum::http::HeaderValue;
use chrono::Duration;
use passage_core::refresh_secret::RefreshHasher;
use passage_core::token::{
    hmac_algorithm, TokenConfig, DEFAULT_ACCESS_TTL_MINS, DEFAULT_REFRESH_TTL_HOURS,
};

/// Default Argon2 memory cost in KiB (19 MiB).
const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;
/// Default Argon2 pass count.
const DEFAULT_HASH_ITERATIONS: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Argon2 cost parameters for refresh-secret hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl HashConfig {
    pub fn hasher(&self) -> Result<RefreshHasher, passage_core::CoreError> {
        RefreshHasher::new(self.memory_kib, self.iterations, 1)
    }
}

/// Server configuration loaded from environment variables.
///
/// Built once at startup, before the store and the services, and read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Whether token cookies carry the `Secure` attribute (default: `true`).
    pub cookie_secure: bool,
    /// Anomaly webhook target. Anomalies are only logged when unset.
    pub webhook_url: Option<String>,
    /// Signing key and token lifetimes.
    pub tokens: TokenConfig,
    pub hash: HashConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Required | Default                 |
    /// |---------------------------|----------|-------------------------|
    /// | `SIGNING_KEY`             | **yes**  | --                      |
    /// | `SIGNING_ALGORITHM`       | no       | `HS512`                 |
    /// | `ACCESS_TOKEN_TTL_MINS`   | no       | `15`                    |
    /// | `REFRESH_TOKEN_TTL_HOURS` | no       | `48`                    |
    /// | `REFRESH_HASH_MEMORY_KIB` | no       | `19456`                 |
    /// | `REFRESH_HASH_ITERATIONS` | no       | `2`                     |
    /// | `WEBHOOK_URL`             | no       | --                      |
    /// | `HOST`                    | no       | `0.0.0.0`               |
    /// | `PORT`                    | no       | `3000`                  |
    /// | `CORS_ORIGINS`            | no       | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | no       | `30`                    |
    /// | `COOKIE_SECURE`           | no       | `true`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let signing_key = var("SIGNING_KEY").ok_or(ConfigError::Missing("SIGNING_KEY"))?;

        let mut tokens = TokenConfig::new(signing_key);
        if let Some(name) = var("SIGNING_ALGORITHM") {
            tokens.algorithm = hmac_algorithm(&name).ok_or_else(|| ConfigError::Invalid {
                var: "SIGNING_ALGORITHM",
                value: name.clone(),
                reason: "expected HS256, HS384 or HS512".into(),
            })?;
        }

        let access_mins: i64 =
            parse_or(&var, "ACCESS_TOKEN_TTL_MINS", DEFAULT_ACCESS_TTL_MINS)?;
        let refresh_hours: i64 =
            parse_or(&var, "REFRESH_TOKEN_TTL_HOURS", DEFAULT_REFRESH_TTL_HOURS)?;
        if access_mins <= 0 || refresh_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_TTL_MINS/REFRESH_TOKEN_TTL_HOURS",
                value: format!("{access_mins}/{refresh_hours}"),
                reason: "token lifetimes must be positive".into(),
            });
        }
        tokens.access_token_ttl = Duration::minutes(access_mins);
        tokens.refresh_token_ttl = Duration::hours(refresh_hours);

        let hash = HashConfig {
            memory_kib: parse_or(&var, "REFRESH_HASH_MEMORY_KIB", DEFAULT_HASH_MEMORY_KIB)?,
            iterations: parse_or(&var, "REFRESH_HASH_ITERATIONS", DEFAULT_HASH_ITERATIONS)?,
        };
        hash.hasher().map_err(|e| ConfigError::Invalid {
            var: "REFRESH_HASH_MEMORY_KIB/REFRESH_HASH_ITERATIONS",
            value: format!("{}/{}", hash.memory_kib, hash.iterations),
            reason: e.to_string(),
        })?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: origin.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "PORT", 3000)?,
            cors_origins,
            request_timeout_secs: parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?,
            cookie_secure: parse_or(&var, "COOKIE_SECURE", true)?,
            webhook_url: var("WEBHOOK_URL"),
            tokens,
            hash,
        })
    }
}

/// Parse `key` if present, otherwise fall back to `default`.
fn parse_or<T>(
    var: &impl Fn(&'static str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
