//! Balance transfer between two accounts.
//!
//! A transfer is guarded before anything is read, runs its read-modify-write
//! under the locks of both accounts, and persists both balances through one
//! atomic `save_balances` call. Every store call is bounded by a deadline.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bank_adapters::{Account, AccountId, AccountStore, BalanceUpdate, StoreError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::locks::AccountLocks;

/// Which side of a transfer an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer amount must be positive")]
    NonPositiveAmount,

    #[error("cannot transfer to the same account")]
    SameAccount,

    #[error("{0} account not found")]
    AccountNotFound(Side),

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("transfer amount out of range")]
    AmountOutOfRange,

    /// A lookup did not finish before the deadline. Nothing was written.
    #[error("account store did not respond in time")]
    Timeout,

    /// Persisting the balances did not finish before the deadline; the write
    /// may or may not have been committed.
    #[error("transfer from account {from} to account {to} did not complete, balances need reconciliation")]
    PartialTransferFailure { from: AccountId, to: AccountId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransferIntent {
    #[serde(rename = "from_account_id")]
    pub from: AccountId,
    #[serde(rename = "to_account_id")]
    pub to: AccountId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Decimal,
    pub from_balance: Decimal,
    pub to_balance: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct TransferPolicy {
    /// How far below zero the source balance may go.
    pub overdraft_limit: Decimal,
    /// Deadline for each individual store call.
    pub store_timeout: Duration,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            overdraft_limit: Decimal::ZERO,
            store_timeout: Duration::from_secs(5),
        }
    }
}

pub struct TransferService {
    store: Arc<dyn AccountStore>,
    locks: AccountLocks,
    policy: TransferPolicy,
}

impl TransferService {
    pub fn new(store: Arc<dyn AccountStore>, policy: TransferPolicy) -> Self {
        Self {
            store,
            locks: AccountLocks::new(),
            policy,
        }
    }

    /// Move `intent.amount` from one account to another.
    pub async fn transfer(
        &self,
        intent: TransferIntent,
        initiated_by: AccountId,
    ) -> Result<TransferReceipt, TransferError> {
        if intent.amount <= Decimal::ZERO {
            return Err(TransferError::NonPositiveAmount);
        }
        if intent.from == intent.to {
            return Err(TransferError::SameAccount);
        }

        let _guard = self.locks.lock_pair(intent.from, intent.to).await;

        let source = self.lookup(intent.from, Side::Source).await?;
        let destination = self.lookup(intent.to, Side::Destination).await?;

        let from_balance = source
            .balance
            .checked_sub(intent.amount)
            .ok_or(TransferError::AmountOutOfRange)?;
        let to_balance = destination
            .balance
            .checked_add(intent.amount)
            .ok_or(TransferError::AmountOutOfRange)?;

        if from_balance < -self.policy.overdraft_limit {
            debug!(
                from_account_id = %intent.from,
                balance = %source.balance,
                amount = %intent.amount,
                "Transfer refused by overdraft policy"
            );
            return Err(TransferError::InsufficientFunds);
        }

        let updates = [
            BalanceUpdate {
                id: source.id,
                expected: source.balance,
                balance: from_balance,
            },
            BalanceUpdate {
                id: destination.id,
                expected: destination.balance,
                balance: to_balance,
            },
        ];

        match timeout(self.policy.store_timeout, self.store.save_balances(&updates)).await {
            Ok(result) => result?,
            Err(_) => {
                error!(
                    event = "transfer.partial_failure",
                    from_account_id = %intent.from,
                    to_account_id = %intent.to,
                    amount = %intent.amount,
                    initiated_by = %initiated_by,
                    "Balance write timed out, outcome unknown; reconcile manually"
                );
                return Err(TransferError::PartialTransferFailure {
                    from: intent.from,
                    to: intent.to,
                });
            }
        }

        info!(
            event = "transfer.completed",
            from_account_id = %intent.from,
            to_account_id = %intent.to,
            amount = %intent.amount,
            initiated_by = %initiated_by,
            "Transfer completed"
        );

        Ok(TransferReceipt {
            from: intent.from,
            to: intent.to,
            amount: intent.amount,
            from_balance,
            to_balance,
        })
    }

    async fn lookup(&self, id: AccountId, side: Side) -> Result<Account, TransferError> {
        self.bounded(self.store.get_account_by_id(id))
            .await?
            .ok_or(TransferError::AccountNotFound(side))
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, TransferError> {
        timeout(self.policy.store_timeout, call)
            .await
            .map_err(|_| TransferError::Timeout)?
            .map_err(TransferError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bank_adapters::{AccountNumber, InMemoryStore, NewAccount};

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    async fn open(store: &InMemoryStore, number: AccountNumber, balance: Decimal) -> AccountId {
        let account = store
            .create_account(NewAccount {
                first_name: "Ana".to_string(),
                last_name: "Silva".to_string(),
                number,
                password_hash: String::new(),
            })
            .await
            .unwrap();
        store
            .save_balances(&[BalanceUpdate {
                id: account.id,
                expected: Decimal::ZERO,
                balance,
            }])
            .await
            .unwrap();
        account.id
    }

    async fn balance(store: &InMemoryStore, id: AccountId) -> Decimal {
        store.get_account_by_id(id).await.unwrap().unwrap().balance
    }

    fn intent(from: AccountId, to: AccountId, amount: Decimal) -> TransferIntent {
        TransferIntent { from, to, amount }
    }

    #[tokio::test]
    async fn test_transfer_moves_and_conserves() {
        let store = Arc::new(InMemoryStore::new());
        let a = open(&store, 1, dec(500)).await;
        let b = open(&store, 2, dec(120)).await;
        let service = TransferService::new(store.clone(), TransferPolicy::default());

        let receipt = service.transfer(intent(a, b, dec(200)), a).await.unwrap();

        assert_eq!(receipt.from_balance, dec(300));
        assert_eq!(receipt.to_balance, dec(320));
        assert_eq!(balance(&store, a).await, dec(300));
        assert_eq!(balance(&store, b).await, dec(320));
        assert_eq!(balance(&store, a).await + balance(&store, b).await, dec(620));
    }

    #[tokio::test]
    async fn test_fractional_amounts_are_exact() {
        let store = Arc::new(InMemoryStore::new());
        let a = open(&store, 1, Decimal::new(30, 2)).await;
        let b = open(&store, 2, Decimal::ZERO).await;
        let service = TransferService::new(store.clone(), TransferPolicy::default());

        service.transfer(intent(a, b, Decimal::new(10, 2)), a).await.unwrap();
        service.transfer(intent(a, b, Decimal::new(20, 2)), a).await.unwrap();

        assert_eq!(balance(&store, a).await, Decimal::ZERO);
        assert_eq!(balance(&store, b).await, Decimal::new(30, 2));
    }

    #[tokio::test]
    async fn test_guards_reject_before_any_write() {
        let store = Arc::new(InMemoryStore::new());
        let a = open(&store, 1, dec(50)).await;
        let b = open(&store, 2, dec(0)).await;
        let service = TransferService::new(store.clone(), TransferPolicy::default());

        let err = service.transfer(intent(a, b, dec(0)), a).await.unwrap_err();
        assert!(matches!(err, TransferError::NonPositiveAmount));

        let err = service.transfer(intent(a, b, dec(-10)), a).await.unwrap_err();
        assert!(matches!(err, TransferError::NonPositiveAmount));

        let err = service.transfer(intent(a, a, dec(10)), a).await.unwrap_err();
        assert!(matches!(err, TransferError::SameAccount));

        let err = service.transfer(intent(a, b, dec(100)), a).await.unwrap_err();
        assert!(matches!(err, TransferError::InsufficientFunds));

        assert_eq!(balance(&store, a).await, dec(50));
        assert_eq!(balance(&store, b).await, dec(0));
    }

    #[tokio::test]
    async fn test_overdraft_limit_allows_negative_balance() {
        let store = Arc::new(InMemoryStore::new());
        let a = open(&store, 1, dec(50)).await;
        let b = open(&store, 2, dec(0)).await;
        let policy = TransferPolicy {
            overdraft_limit: dec(50),
            ..TransferPolicy::default()
        };
        let service = TransferService::new(store.clone(), policy);

        service.transfer(intent(a, b, dec(100)), a).await.unwrap();
        assert_eq!(balance(&store, a).await, dec(-50));

        let err = service.transfer(intent(a, b, dec(1)), a).await.unwrap_err();
        assert!(matches!(err, TransferError::InsufficientFunds));
    }

    #[tokio::test]
    async fn test_missing_account_names_the_side() {
        let store = Arc::new(InMemoryStore::new());
        let a = open(&store, 1, dec(50)).await;
        let service = TransferService::new(store.clone(), TransferPolicy::default());

        let err = service.transfer(intent(99, a, dec(1)), a).await.unwrap_err();
        assert!(matches!(err, TransferError::AccountNotFound(Side::Source)));

        let err = service.transfer(intent(a, 99, dec(1)), a).await.unwrap_err();
        assert!(matches!(err, TransferError::AccountNotFound(Side::Destination)));

        assert_eq!(balance(&store, a).await, dec(50));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_concurrent_transfers_leave_balances_unchanged() {
        const ROUNDS: usize = 50;

        let store = Arc::new(InMemoryStore::new());
        let a = open(&store, 1, dec(1000)).await;
        let b = open(&store, 2, dec(1000)).await;
        let service = Arc::new(TransferService::new(store.clone(), TransferPolicy::default()));

        let mut handles = Vec::with_capacity(ROUNDS * 2);
        for _ in 0..ROUNDS {
            for (from, to) in [(a, b), (b, a)] {
                let service = Arc::clone(&service);
                handles.push(tokio::spawn(async move {
                    service.transfer(intent(from, to, dec(10)), from).await
                }));
            }
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(balance(&store, a).await, dec(1000));
        assert_eq!(balance(&store, b).await, dec(1000));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_never_lose_updates() {
        let store = Arc::new(InMemoryStore::new());
        let a = open(&store, 1, dec(100)).await;
        let b = open(&store, 2, dec(0)).await;
        let c = open(&store, 3, dec(0)).await;
        let service = Arc::new(TransferService::new(store.clone(), TransferPolicy::default()));

        // 20 transfers of 10 from a balance of 100: exactly 10 can succeed.
        let mut handles = Vec::new();
        for i in 0..20 {
            let service = Arc::clone(&service);
            let to = if i % 2 == 0 { b } else { c };
            handles.push(tokio::spawn(async move {
                service.transfer(intent(a, to, dec(10)), a).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(TransferError::InsufficientFunds) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(balance(&store, a).await, dec(0));
        assert_eq!(balance(&store, b).await + balance(&store, c).await, dec(100));
    }

    /// Delegates to an in-memory store but can stall lookups or writes.
    struct StallingStore {
        inner: Arc<InMemoryStore>,
        stall_lookups: bool,
        stall_writes: bool,
    }

    impl StallingStore {
        async fn stall(&self) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }

    #[async_trait]
    impl AccountStore for StallingStore {
        async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
            self.inner.create_account(account).await
        }

        async fn get_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
            if self.stall_lookups {
                self.stall().await;
            }
            self.inner.get_account_by_id(id).await
        }

        async fn get_account_by_number(
            &self,
            number: AccountNumber,
        ) -> Result<Option<Account>, StoreError> {
            self.inner.get_account_by_number(number).await
        }

        async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
            self.inner.list_accounts().await
        }

        async fn update_account(
            &self,
            id: AccountId,
            first_name: &str,
            last_name: &str,
        ) -> Result<Account, StoreError> {
            self.inner.update_account(id, first_name, last_name).await
        }

        async fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
            self.inner.delete_account(id).await
        }

        async fn save_balances(&self, updates: &[BalanceUpdate]) -> Result<(), StoreError> {
            if self.stall_writes {
                self.stall().await;
            }
            self.inner.save_balances(updates).await
        }
    }

    async fn stalling_service(
        stall_lookups: bool,
        stall_writes: bool,
    ) -> (TransferService, Arc<InMemoryStore>, AccountId, AccountId) {
        let inner = Arc::new(InMemoryStore::new());
        let a = open(&inner, 1, dec(100)).await;
        let b = open(&inner, 2, dec(0)).await;
        let store = Arc::new(StallingStore {
            inner: inner.clone(),
            stall_lookups,
            stall_writes,
        });
        let service = TransferService::new(store, TransferPolicy::default());
        (service, inner, a, b)
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout() {
        let (service, inner, a, b) = stalling_service(true, false).await;

        let err = service.transfer(intent(a, b, dec(10)), a).await.unwrap_err();
        assert!(matches!(err, TransferError::Timeout));
        assert_eq!(balance(&inner, a).await, dec(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_timeout_is_partial_failure() {
        let (service, _inner, a, b) = stalling_service(false, true).await;

        let err = service.transfer(intent(a, b, dec(10)), a).await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::PartialTransferFailure { from, to } if from == a && to == b
        ));
    }

    #[test]
    fn test_intent_deserializes_numbers_and_strings() {
        let parsed: TransferIntent = serde_json::from_str(
            r#"{"from_account_id": 1, "to_account_id": 2, "amount": 100}"#,
        )
        .unwrap();
        assert_eq!(parsed.amount, dec(100));

        let parsed: TransferIntent = serde_json::from_str(
            r#"{"from_account_id": 1, "to_account_id": 2, "amount": "12.34"}"#,
        )
        .unwrap();
        assert_eq!(parsed.amount, Decimal::new(1234, 2));
    }
}
