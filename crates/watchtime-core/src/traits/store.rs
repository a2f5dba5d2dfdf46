//! Quota store trait for pluggable counter backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::{PostId, UserId};

/// A non-zero per-context counter belonging to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextUsage {
    /// The counter post.
    pub post_id: PostId,
    /// Consumed seconds.
    pub seconds: u64,
}

/// All writes produced by one allocation pass for one user.
///
/// Applied by [`QuotaStore::commit`] as a single atomic unit, and only if
/// the counters the pass was planned against still hold the values it read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageCommit {
    /// Global counter value the pass read.
    pub expected_global: u64,
    /// Per-context counter values the pass read, one per written post.
    pub expected_contexts: Vec<(PostId, u64)>,
    /// Seconds to add to each per-context counter.
    pub context_deltas: Vec<(PostId, u64)>,
    /// New absolute value of the global counter, if it changes.
    pub global_seconds: Option<u64>,
}

/// Result of a conditional [`QuotaStore::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every write was applied.
    Applied,
    /// Another writer changed the ledgers since they were read; nothing
    /// was written.
    Conflict,
}

impl UsageCommit {
    /// Whether the commit would write nothing.
    pub fn is_empty(&self) -> bool {
        self.context_deltas.iter().all(|(_, delta)| *delta == 0) && self.global_seconds.is_none()
    }
}

/// Durable storage for the two counter families: per (user, post) and
/// per user globally.
///
/// Counters are created lazily on first write and read as 0 when absent.
/// Implementations must be safe to call concurrently for different users.
#[async_trait]
pub trait QuotaStore: Send + Sync + std::fmt::Debug + 'static {
    /// Consumed seconds for a user's per-context counter.
    async fn get(&self, user: UserId, post: PostId) -> AppResult<u64>;

    /// Consumed seconds on a user's global counter.
    async fn get_global(&self, user: UserId) -> AppResult<u64>;

    /// Adds to a per-context counter. Returns the new value.
    async fn increment(&self, user: UserId, post: PostId, delta: u64) -> AppResult<u64>;

    /// Adds to the global counter. Returns the new value.
    async fn increment_global(&self, user: UserId, delta: u64) -> AppResult<u64>;

    /// Overwrites the global counter.
    async fn set_global(&self, user: UserId, seconds: u64) -> AppResult<()>;

    /// Applies every write of an allocation pass atomically.
    ///
    /// The global counter and each `expected_contexts` counter must still
    /// equal the expected values, checked in the same atomic step as the
    /// writes; otherwise nothing is written and `Conflict` is returned.
    async fn commit(&self, user: UserId, commit: &UsageCommit) -> AppResult<CommitOutcome>;

    /// Lists the user's non-zero per-context counters, ordered by post.
    async fn usage_for_user(&self, user: UserId) -> AppResult<Vec<ContextUsage>>;

    /// Zeroes the global counter and removes per-context counters.
    ///
    /// With `posts = None` every per-context counter is removed; otherwise
    /// only the listed ones. Returns the number of counters removed.
    async fn reset_user(&self, user: UserId, posts: Option<&[PostId]>) -> AppResult<u64>;

    /// Users that have any ledger entry.
    async fn tracked_users(&self) -> AppResult<Vec<UserId>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
