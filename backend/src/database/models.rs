//! Rust structs that represent database table mappings.
//!
//! `AccountRow` mirrors the `accounts` table column for column and converts
//! into the store-agnostic `Account` model.

use bank_adapters::{Account, AccountId, AccountNumber};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Column list matching [`AccountRow`], shared by every query.
pub(crate) const ACCOUNT_COLUMNS: &str =
    "id, first_name, last_name, number, balance, password_hash, created_at";

#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub number: AccountNumber,
    pub balance: Decimal,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            number: row.number,
            balance: row.balance,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}
