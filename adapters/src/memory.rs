//! In-memory implementation of the `AccountStore` trait.
//!
//! Accounts are kept in a single map behind an async `RwLock`, so every
//! operation, including a multi-account balance write, is applied under one
//! write guard. Used when no database is configured and throughout the tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::models::{Account, AccountId, AccountNumber, BalanceUpdate, NewAccount};
use crate::AccountStore;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: BTreeMap<AccountId, Account>,
    last_id: AccountId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.accounts.values().any(|a| a.number == account.number) {
            return Err(StoreError::DuplicateNumber(account.number));
        }

        inner.last_id += 1;
        let created = Account {
            id: inner.last_id,
            first_name: account.first_name,
            last_name: account.last_name,
            number: account.number,
            balance: Decimal::ZERO,
            password_hash: account.password_hash,
            created_at: Utc::now(),
        };
        inner.accounts.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn get_account_by_number(
        &self,
        number: AccountNumber,
    ) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.number == number).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.values().cloned().collect())
    }

    async fn update_account(
        &self,
        id: AccountId,
        first_name: &str,
        last_name: &str,
    ) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        account.first_name = first_name.to_string();
        account.last_name = last_name.to_string();
        Ok(account.clone())
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn save_balances(&self, updates: &[BalanceUpdate]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        // Check every row before touching any of them.
        for update in updates {
            let current = inner
                .accounts
                .get(&update.id)
                .ok_or(StoreError::NotFound(update.id))?;
            if current.balance != update.expected {
                return Err(StoreError::Conflict(update.id));
            }
        }

        for update in updates {
            if let Some(account) = inner.accounts.get_mut(&update.id) {
                account.balance = update.balance;
            }
        }

        Ok(())
    }
}
