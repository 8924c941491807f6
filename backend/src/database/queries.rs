//! Database query functions (Data Access Objects).
//!
//! This module centralizes all direct database operations behind the
//! `AccountStore` trait. Balance writes for a transfer run inside a single
//! transaction with a compare-and-set on each row's previous balance.

use async_trait::async_trait;
use bank_adapters::{
    Account, AccountId, AccountNumber, AccountStore, BalanceUpdate, NewAccount, StoreError,
};
use sqlx::PgPool;

use super::models::{AccountRow, ACCOUNT_COLUMNS};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::unavailable(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => is_unique_violation_code(db.code().as_deref()),
        _ => false,
    }
}

fn is_unique_violation_code(code: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION)
}

/// Row locks are taken in ascending id order so concurrent transactions over
/// the same accounts wait on each other instead of deadlocking.
fn in_lock_order(updates: &[BalanceUpdate]) -> Vec<BalanceUpdate> {
    let mut ordered = updates.to_vec();
    ordered.sort_by_key(|update| update.id);
    ordered
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let query = format!(
            "INSERT INTO accounts (first_name, last_name, password_hash, number, balance) \
             VALUES ($1, $2, $3, $4, 0) RETURNING {ACCOUNT_COLUMNS}"
        );

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.password_hash)
            .bind(account.number)
            .fetch_one(&self.pool)
            .await
            .map(Account::from)
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::DuplicateNumber(account.number)
                } else {
                    unavailable(err)
                }
            })
    }

    async fn get_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Account::from))
            .map_err(unavailable)
    }

    async fn get_account_by_number(
        &self,
        number: AccountNumber,
    ) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE number = $1");

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(number)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Account::from))
            .map_err(unavailable)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id");

        sqlx::query_as::<_, AccountRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Account::from).collect())
            .map_err(unavailable)
    }

    async fn update_account(
        &self,
        id: AccountId,
        first_name: &str,
        last_name: &str,
    ) -> Result<Account, StoreError> {
        let query = format!(
            "UPDATE accounts SET first_name = $1, last_name = $2 WHERE id = $3 \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(first_name)
            .bind(last_name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(Account::from)
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn save_balances(&self, updates: &[BalanceUpdate]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        for update in in_lock_order(updates) {
            let result =
                sqlx::query("UPDATE accounts SET balance = $1 WHERE id = $2 AND balance = $3")
                    .bind(update.balance)
                    .bind(update.id)
                    .bind(update.expected)
                    .execute(&mut *tx)
                    .await
                    .map_err(unavailable)?;

            if result.rows_affected() == 0 {
                let exists: Option<AccountId> =
                    sqlx::query_scalar("SELECT id FROM accounts WHERE id = $1")
                        .bind(update.id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(unavailable)?;
                tx.rollback().await.map_err(unavailable)?;

                return Err(match exists {
                    Some(_) => StoreError::Conflict(update.id),
                    None => StoreError::NotFound(update.id),
                });
            }
        }

        tx.commit().await.map_err(unavailable)
    }
}
