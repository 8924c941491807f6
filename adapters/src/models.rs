//! Generic data models for the `adapters` crate.
//!
//! These models define the account record as every store adapter returns it,
//! plus the inputs for account creation and balance persistence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type AccountId = i64;
pub type AccountNumber = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub number: AccountNumber,
    /// Serialized as a decimal string so no digits are lost.
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub number: AccountNumber,
    pub password_hash: String,
}

/// A compare-and-set balance write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub id: AccountId,
    pub expected: Decimal,
    pub balance: Decimal,
}
