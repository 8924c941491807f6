//! Core `adapters` crate for abstracting account persistence.
//!
//! This crate defines the `AccountStore` trait, which outlines the storage
//! operations the banking backend depends on, together with the shared account
//! models and an in-memory implementation. The PostgreSQL implementation lives
//! in the backend's `database` module.

pub mod errors;
pub mod memory;
pub mod models;

use async_trait::async_trait;

pub use errors::StoreError;
pub use memory::InMemoryStore;
pub use models::{Account, AccountId, AccountNumber, BalanceUpdate, NewAccount};

/// Persistence operations for accounts.
///
/// Lookups return `Ok(None)` for a missing account; mutations of a missing
/// account return [`StoreError::NotFound`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account with a zero balance and return it with its assigned id.
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn get_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn get_account_by_number(
        &self,
        number: AccountNumber,
    ) -> Result<Option<Account>, StoreError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Replace the display names of an account.
    async fn update_account(
        &self,
        id: AccountId,
        first_name: &str,
        last_name: &str,
    ) -> Result<Account, StoreError>;

    async fn delete_account(&self, id: AccountId) -> Result<(), StoreError>;

    /// Apply every update as a single unit of work.
    ///
    /// Each update only applies if the stored balance still equals
    /// `expected`; otherwise nothing is written and [`StoreError::Conflict`]
    /// is returned. Readers never observe a subset of the updates.
    async fn save_balances(&self, updates: &[BalanceUpdate]) -> Result<(), StoreError>;
}
