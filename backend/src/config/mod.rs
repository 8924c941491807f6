//! Central module for application-wide configuration settings.
//!
//! This module loads configuration from environment variables: the token
//! signing secret and lifetime, the listen address, store deadlines, the
//! overdraft policy and the optional database connection.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::database::DatabaseConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Symmetric key used to sign and verify access tokens.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub const MIN_LEN: usize = 32;

    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.len() < Self::MIN_LEN {
            return Err(ConfigError::invalid(
                "JWT_SECRET",
                format!("must be at least {} bytes", Self::MIN_LEN),
            ));
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(..)")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: SigningSecret,
    /// Lifetime of issued access tokens.
    pub token_ttl: Duration,
    /// Deadline for each store call made by a transfer.
    pub store_timeout: Duration,
    pub request_timeout: Duration,
    /// How far below zero a source balance may go. Zero forbids overdrafts.
    pub overdraft_limit: Decimal,
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `JWT_SECRET`: token signing secret, at least 32 bytes (required)
    /// - `TOKEN_TTL`: access token lifetime (default: "1h")
    /// - `BIND_ADDR`: listen address (default: "0.0.0.0:8080")
    /// - `STORE_TIMEOUT`: per-call store deadline for transfers (default: "5s")
    /// - `REQUEST_TIMEOUT`: whole-request deadline (default: "30s")
    /// - `OVERDRAFT_LIMIT`: allowed negative balance (default: "0")
    /// - `DATABASE_URL`, `DB_MAX_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT`: see [`DatabaseConfig`]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))
            .and_then(SigningSecret::new)?;

        let bind_addr = parse_or(&lookup, "BIND_ADDR", "0.0.0.0:8080".parse().ok(), |s| {
            SocketAddr::from_str(s).ok()
        })?;

        let token_ttl = duration_or(&lookup, "TOKEN_TTL", Duration::from_secs(60 * 60))?;
        let store_timeout = duration_or(&lookup, "STORE_TIMEOUT", Duration::from_secs(5))?;
        let request_timeout = duration_or(&lookup, "REQUEST_TIMEOUT", Duration::from_secs(30))?;

        let overdraft_limit = parse_or(&lookup, "OVERDRAFT_LIMIT", Some(Decimal::ZERO), |s| {
            Decimal::from_str(s).ok().filter(|d| !d.is_sign_negative())
        })?;

        let database = lookup("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .map(|url| DatabaseConfig::from_lookup(url, &lookup))
            .transpose()?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            store_timeout,
            request_timeout,
            overdraft_limit,
            database,
        })
    }
}

/// Parse an optional variable, falling back to `default` when it is unset.
pub(crate) fn parse_or<F, T>(
    lookup: &F,
    key: &'static str,
    default: Option<T>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse(raw.trim()).ok_or_else(|| ConfigError::invalid(key, raw)),
        None => default.ok_or(ConfigError::Missing(key)),
    }
}

pub(crate) fn duration_or<F>(
    lookup: &F,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, Some(default), parse_duration)
}

/// Parse duration string (e.g., "30s", "5m", "1h", "100ms"). Bare numbers are seconds.
///
/// Returns `None` for malformed or zero durations.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_lowercase();
    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60 * 1000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 60 * 60 * 1000)
    } else {
        (s.as_str(), 1000)
    };

    num_str
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .and_then(|n| n.checked_mul(multiplier))
        .map(Duration::from_millis)
}
