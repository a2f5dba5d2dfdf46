//! Per-user serialization of ledger read-modify-write sequences.
//!
//! The lock is process-local. Writers in other processes sharing the
//! store are kept consistent by the store's conditional commit.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use watchtime_core::types::UserId;

type LockTable = DashMap<UserId, Arc<Mutex<()>>>;

/// One async mutex per user.
///
/// Holders of a user's guard are the only writers of that user's ledgers
/// in this process for as long as the guard lives; different users never
/// contend. Entries are dropped once no guard or waiter refers to them.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: Arc<LockTable>,
}

impl UserLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the user's lock.
    pub async fn acquire(&self, user: UserId) -> UserGuard {
        let lock = self.locks.entry(user).or_default().clone();
        let guard = lock.lock_owned().await;
        UserGuard {
            guard: Some(guard),
            user,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of users currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no user is locked or waited on.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Holds a user's lock; releases it and prunes the idle entry on drop.
#[derive(Debug)]
pub struct UserGuard {
    guard: Option<OwnedMutexGuard<()>>,
    user: UserId,
    locks: Arc<LockTable>,
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        // Release first so the mutex's own reference is gone.
        self.guard.take();
        // Count 1 means only the table holds it: nobody waits.
        self.locks
            .remove_if(&self.user, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_waits() {
        let locks = UserLocks::new();
        let guard = locks.acquire(UserId(1)).await;

        let contended = tokio::time::timeout(Duration::from_millis(20), locks.acquire(UserId(1)));
        assert!(contended.await.is_err());

        drop(guard);
        let _again = locks.acquire(UserId(1)).await;
    }

    #[tokio::test]
    async fn test_other_users_do_not_wait() {
        let locks = UserLocks::new();
        let _a = locks.acquire(UserId(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(20), locks.acquire(UserId(2))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = UserLocks::new();
        for user in 1..=100 {
            let _guard = locks.acquire(UserId(user)).await;
        }
        assert!(locks.is_empty());

        let held = locks.acquire(UserId(7)).await;
        assert_eq!(locks.len(), 1);
        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_kept_while_waiter_queued() {
        let locks = UserLocks::new();
        let held = locks.acquire(UserId(3)).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(UserId(3)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(held);
        assert_eq!(locks.len(), 1);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
