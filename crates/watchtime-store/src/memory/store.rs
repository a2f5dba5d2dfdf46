//! In-memory quota store using dashmap for single-node deployments.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use watchtime_core::result::AppResult;
use watchtime_core::traits::store::{CommitOutcome, ContextUsage, QuotaStore, UsageCommit};
use watchtime_core::types::{PostId, UserId};

/// Both ledgers for one user.
///
/// `per_post` doubles as the index of the user's context counters, so
/// reset and report never scan foreign keys.
#[derive(Debug, Default, Clone)]
struct UserLedger {
    /// Global consumed seconds.
    global: u64,
    /// Consumed seconds per counter post.
    per_post: BTreeMap<PostId, u64>,
}

/// In-memory quota store.
///
/// Each user's ledger lives behind one dashmap shard entry, so a
/// [`QuotaStore::commit`] is atomic with respect to other calls for the
/// same user. Suitable for single-node deployments only.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuotaStore {
    /// Ledgers keyed by user.
    ledgers: Arc<DashMap<UserId, UserLedger>>,
}

impl MemoryQuotaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn get(&self, user: UserId, post: PostId) -> AppResult<u64> {
        Ok(self
            .ledgers
            .get(&user)
            .and_then(|ledger| ledger.per_post.get(&post).copied())
            .unwrap_or(0))
    }

    async fn get_global(&self, user: UserId) -> AppResult<u64> {
        Ok(self.ledgers.get(&user).map(|l| l.global).unwrap_or(0))
    }

    async fn increment(&self, user: UserId, post: PostId, delta: u64) -> AppResult<u64> {
        let mut ledger = self.ledgers.entry(user).or_default();
        let counter = ledger.per_post.entry(post).or_insert(0);
        *counter = counter.saturating_add(delta);
        Ok(*counter)
    }

    async fn increment_global(&self, user: UserId, delta: u64) -> AppResult<u64> {
        let mut ledger = self.ledgers.entry(user).or_default();
        ledger.global = ledger.global.saturating_add(delta);
        Ok(ledger.global)
    }

    async fn set_global(&self, user: UserId, seconds: u64) -> AppResult<()> {
        self.ledgers.entry(user).or_default().global = seconds;
        Ok(())
    }

    async fn commit(&self, user: UserId, commit: &UsageCommit) -> AppResult<CommitOutcome> {
        if commit.is_empty() {
            return Ok(CommitOutcome::Applied);
        }

        let mut ledger = self.ledgers.entry(user).or_default();
        let moved = ledger.global != commit.expected_global
            || commit.expected_contexts.iter().any(|(post, expected)| {
                ledger.per_post.get(post).copied().unwrap_or(0) != *expected
            });
        if moved {
            debug!(user_id = %user, "Ledger changed since it was read");
            return Ok(CommitOutcome::Conflict);
        }

        for (post, delta) in &commit.context_deltas {
            if *delta == 0 {
                continue;
            }
            let counter = ledger.per_post.entry(*post).or_insert(0);
            *counter = counter.saturating_add(*delta);
        }
        if let Some(global) = commit.global_seconds {
            ledger.global = global;
        }

        debug!(
            user_id = %user,
            contexts = commit.context_deltas.len(),
            global = ?commit.global_seconds,
            "Committed usage"
        );
        Ok(CommitOutcome::Applied)
    }

    async fn usage_for_user(&self, user: UserId) -> AppResult<Vec<ContextUsage>> {
        Ok(self
            .ledgers
            .get(&user)
            .map(|ledger| {
                ledger
                    .per_post
                    .iter()
                    .filter(|(_, seconds)| **seconds > 0)
                    .map(|(post, seconds)| ContextUsage {
                        post_id: *post,
                        seconds: *seconds,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn reset_user(&self, user: UserId, posts: Option<&[PostId]>) -> AppResult<u64> {
        let Some(mut ledger) = self.ledgers.get_mut(&user) else {
            return Ok(0);
        };

        ledger.global = 0;
        let removed = match posts {
            None => {
                let count = ledger.per_post.len() as u64;
                ledger.per_post.clear();
                count
            }
            Some(posts) => posts
                .iter()
                .filter(|post| ledger.per_post.remove(post).is_some())
                .count() as u64,
        };

        debug!(user_id = %user, removed, "Reset user ledger");
        Ok(removed)
    }

    async fn tracked_users(&self) -> AppResult<Vec<UserId>> {
        let mut users: Vec<UserId> = self.ledgers.iter().map(|entry| *entry.key()).collect();
        users.sort();
        Ok(users)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
