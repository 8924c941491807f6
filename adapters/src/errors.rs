//! Custom error types specific to the `adapters` crate.
//!
//! These errors are shared by every `AccountStore` implementation so the
//! backend can map storage failures to responses without knowing which
//! adapter produced them.

use thiserror::Error;

use crate::models::{AccountId, AccountNumber};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account {0} not found")]
    NotFound(AccountId),

    #[error("account number {0} is already in use")]
    DuplicateNumber(AccountNumber),

    /// The stored balance no longer matches the balance the caller read.
    #[error("balance of account {0} changed concurrently")]
    Conflict(AccountId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
