//! Core business logic for the authentication system.
//!
//! This service handles password hashing and verification (Argon2id) and the
//! issuance and validation of HS256 access tokens. Token validation is
//! stateless: a token is valid while its signature checks out and its
//! embedded expiry has not passed.

use std::time::Duration;

use argon2::password_hash::{self, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use bank_adapters::{Account, AccountId};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::Deserialize;

use super::errors::{AuthError, CredentialError};
use super::models::Claims;
use crate::config::SigningSecret;

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

/// Verify a password against a stored PHC digest.
///
/// The final digest comparison inside argon2 is constant-time.
pub fn verify_password(digest: &str, password: &str) -> Result<(), CredentialError> {
    let parsed = PasswordHash::new(digest).map_err(|e| CredentialError::Hashing(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(password_hash::Error::Password) => Err(CredentialError::Mismatch),
        Err(e) => Err(CredentialError::Hashing(e.to_string())),
    }
}

/// [`hash_password`] on the blocking thread pool.
pub async fn hash_password_async(password: String) -> Result<String, CredentialError> {
    spawn_credential_task(move || hash_password(&password)).await
}

/// [`verify_password`] on the blocking thread pool.
pub async fn verify_password_async(digest: String, password: String) -> Result<(), CredentialError> {
    spawn_credential_task(move || verify_password(&digest, &password)).await
}

async fn spawn_credential_task<T, F>(task: F) -> Result<T, CredentialError>
where
    F: FnOnce() -> Result<T, CredentialError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CredentialError::Hashing(e.to_string()))?
}

// =============================================================================
// Access tokens
// =============================================================================

const EXPECTED_ALGORITHM: &str = "HS256";

/// Issues and validates HS256 access tokens with a fixed lifetime.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a token for `account` expiring `ttl` from now.
    pub fn issue(&self, account: &Account) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let lifetime = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);

        self.sign(&Claims {
            sub: account.id.to_string(),
            account_number: account.number,
            name: account.first_name.clone(),
            iat,
            exp: iat.saturating_add(lifetime),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Validate a token and return the account id it was issued for.
    pub fn validate(&self, token: &str) -> Result<AccountId, AuthError> {
        ensure_expected_algorithm(token)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidAlgorithm => AuthError::WrongAlgorithm,
                _ => AuthError::MalformedClaims,
            }
        })?;

        data.claims.account_id()
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Reject tokens whose header names any algorithm but HS256 before the
/// signature is looked at. `none` never reaches the verifier.
fn ensure_expected_algorithm(token: &str) -> Result<(), AuthError> {
    let header = token
        .split('.')
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or(AuthError::MalformedClaims)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedClaims)?;
    let raw: RawHeader = serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedClaims)?;

    if raw.alg != EXPECTED_ALGORITHM {
        return Err(AuthError::WrongAlgorithm);
    }
    Ok(())
}
