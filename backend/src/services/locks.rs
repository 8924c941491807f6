//! Per-account mutual exclusion for read-modify-write cycles.
//!
//! Account ids hash onto a fixed set of async mutexes (stripes), so memory
//! stays constant no matter how many ids are seen. Two accounts sharing a
//! stripe simply serialize. A pair is always locked in ascending stripe order
//! so two transfers over the same pair in opposite directions cannot deadlock.

use bank_adapters::AccountId;
use tokio::sync::{Mutex, MutexGuard};

/// Default number of stripes.
pub const DEFAULT_STRIPES: usize = 1024;

#[derive(Debug)]
pub struct AccountLocks {
    stripes: Box<[Mutex<()>]>,
}

/// Holds the locks of one or two accounts until dropped.
#[derive(Debug)]
pub struct PairGuard<'a> {
    _first: MutexGuard<'a, ()>,
    _second: Option<MutexGuard<'a, ()>>,
}

impl Default for AccountLocks {
    fn default() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// At least one stripe is always created.
    pub fn with_stripes(count: usize) -> Self {
        Self {
            stripes: (0..count.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    fn stripe_of(&self, id: AccountId) -> usize {
        // rem_euclid keeps negative ids in range.
        id.rem_euclid(self.stripes.len() as i64) as usize
    }

    /// Lock both accounts, lowest stripe first. Two ids on the same stripe,
    /// including an account with itself, take a single lock.
    pub async fn lock_pair(&self, a: AccountId, b: AccountId) -> PairGuard<'_> {
        let (sa, sb) = (self.stripe_of(a), self.stripe_of(b));
        let (low, high) = if sa <= sb { (sa, sb) } else { (sb, sa) };

        let first = self.stripes[low].lock().await;
        let second = if low == high {
            None
        } else {
            Some(self.stripes[high].lock().await)
        };

        PairGuard {
            _first: first,
            _second: second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_does_not_deadlock() {
        let locks = AccountLocks::new();
        let guard = tokio::time::timeout(Duration::from_secs(1), locks.lock_pair(3, 3)).await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn test_ids_sharing_a_stripe_do_not_deadlock() {
        let locks = AccountLocks::with_stripes(8);
        let guard = tokio::time::timeout(Duration::from_secs(1), locks.lock_pair(3, 11)).await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn test_overlapping_pair_waits() {
        let locks = Arc::new(AccountLocks::new());
        let guard = locks.lock_pair(1, 2).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock_pair(2, 3).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_pairs_do_not_block() {
        let locks = AccountLocks::new();
        let _first = locks.lock_pair(1, 2).await;

        let second = tokio::time::timeout(Duration::from_secs(1), locks.lock_pair(3, 4)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_lock_state_does_not_grow_with_ids() {
        let locks = AccountLocks::with_stripes(64);

        for id in 0..10_000 {
            let guard = locks.lock_pair(id, id + 1_000_000).await;
            drop(guard);
        }
        let _negative = locks.lock_pair(-5, i64::MAX).await;

        assert_eq!(locks.stripe_count(), 64);
    }

    #[tokio::test]
    async fn test_zero_stripes_still_locks() {
        let locks = AccountLocks::with_stripes(0);
        assert_eq!(locks.stripe_count(), 1);
        let _guard = locks.lock_pair(1, 2).await;
    }
}
