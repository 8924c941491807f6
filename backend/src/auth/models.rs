//! Data structures for authentication-related entities.
//!
//! This module defines the JWT claims, the authenticated-account request
//! context inserted by the middleware, and the sign-in request and response.

use bank_adapters::{AccountId, AccountNumber};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,
    pub account_number: AccountNumber,
    /// Account holder's first name
    pub name: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl Claims {
    pub fn account_id(&self) -> Result<AccountId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::MalformedClaims)
    }
}

/// Identity resolved by the authentication middleware, available to handlers
/// through request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub id: AccountId,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub account_number: AccountNumber,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub access_token: String,
}
