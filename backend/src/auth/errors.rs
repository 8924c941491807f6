//! Custom error types specific to authentication failures.
//!
//! `AuthError` covers everything that ends in a 401 (plus token signing
//! failures, which are internal). `CredentialError` is the outcome of
//! password hashing and verification.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing token")]
    MissingCredentials,

    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token claims")]
    MalformedClaims,

    /// The token header names an algorithm other than HS256, including `none`.
    #[error("unexpected token signing algorithm")]
    WrongAlgorithm,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("password does not match")]
    Mismatch,
}
