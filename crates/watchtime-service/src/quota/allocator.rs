//! Usage allocation: applies batched playback reports under the
//! per-context and global caps.
//!
//! A batch is processed in two phases. Every limit and counter is read
//! and the whole batch is planned by [`plan_allocation`], which is pure;
//! the resulting [`UsageCommit`] is then written in one atomic store call.
//! A failed read therefore leaves the ledgers untouched.
//!
//! The commit only lands if the counters it was planned against are
//! unchanged, so writers in other processes sharing the store (another
//! server, the CLI) can never have their writes overwritten or the caps
//! overrun; a rejected commit re-reads and re-plans. Within one process
//! the user's lock keeps concurrent batches from racing at all.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use watchtime_core::AppError;
use watchtime_core::result::AppResult;
use watchtime_core::traits::store::{CommitOutcome, QuotaStore, UsageCommit};
use watchtime_core::types::{ContentContext, ContextSnapshot, PostId, QuotaSnapshot, UserId};

use super::locks::UserLocks;
use super::resolver::LimitResolver;

/// Read-plan-commit passes attempted before giving up on a busy ledger.
const MAX_COMMIT_ATTEMPTS: usize = 8;

/// One itemized usage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Where the seconds were watched.
    pub context: ContentContext,
    /// Seconds watched since the last report.
    pub seconds: u64,
}

/// A client batch: the legacy scalar plus itemized entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    /// Scalar total sent by older clients.
    pub legacy_seconds: u64,
    /// Itemized entries in client order.
    pub entries: Vec<UsageEntry>,
}

impl UsageReport {
    /// Whether the report carries nothing to apply.
    pub fn is_noop(&self) -> bool {
        self.legacy_seconds == 0 && self.entries.iter().all(|e| e.seconds == 0)
    }
}

/// Result of applying a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutcome {
    /// The global ledger after the batch.
    pub global: QuotaSnapshot,
    /// One snapshot per touched context key, first-seen order.
    pub contexts: Vec<ContextSnapshot>,
    /// Seconds added to the global ledger.
    pub applied_seconds: u64,
}

/// An entry with its limit and stored counter already read.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    /// The entry's context.
    pub context: ContentContext,
    /// Seconds the client asked to apply.
    pub proposed: u64,
    /// Resolved context limit (0 = unlimited).
    pub limit_seconds: u64,
    /// Counter value read before the batch started.
    pub stored_consumed: u64,
}

/// The global ledger as read before the batch.
#[derive(Debug, Clone, Copy)]
pub struct GlobalLedger {
    /// Resolved global limit (0 = unlimited).
    pub limit_seconds: u64,
    /// Consumed seconds before the batch.
    pub consumed_seconds: u64,
}

/// Writes and snapshots produced by planning a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Writes to apply atomically.
    pub commit: UsageCommit,
    /// Context snapshots as they will read after the commit.
    pub contexts: Vec<ContextSnapshot>,
    /// Seconds added to the global ledger.
    pub applied_total: u64,
    /// Global consumed seconds after the commit.
    pub global_after: u64,
}

/// Plans a batch without touching any store.
///
/// Entries are served in order; when the global cap binds, earlier
/// entries consume the budget first. Entries on the same counter post see
/// the seconds granted to earlier entries of the batch. The legacy scalar
/// and the itemized entries do not stack: the larger of the two sets the
/// global increment.
pub fn plan_allocation(
    global: GlobalLedger,
    legacy_seconds: u64,
    entries: &[PlannedEntry],
) -> AllocationPlan {
    let limited = global.limit_seconds > 0;
    let original = global.consumed_seconds;
    // None means no global ceiling.
    let mut budget = limited.then(|| global.limit_seconds.saturating_sub(original));

    let unchanged = AllocationPlan {
        commit: UsageCommit {
            expected_global: original,
            ..UsageCommit::default()
        },
        global_after: original,
        ..AllocationPlan::default()
    };
    if budget == Some(0) {
        return unchanged;
    }

    let mut pending: HashMap<PostId, u64> = HashMap::new();
    let mut expected: Vec<(PostId, u64)> = Vec::new();
    let mut deltas: Vec<(PostId, u64)> = Vec::new();
    let mut snapshots: Vec<ContextSnapshot> = Vec::new();
    let mut applied_total: u64 = 0;

    for entry in entries.iter().filter(|e| e.proposed > 0) {
        let counter = entry.context.counter_post();
        let already = counter.and_then(|p| pending.get(&p).copied()).unwrap_or(0);
        let consumed = entry.stored_consumed.saturating_add(already);

        let mut cap = entry.proposed;
        if entry.limit_seconds > 0 {
            cap = cap.min(entry.limit_seconds.saturating_sub(consumed));
        }
        if let Some(remaining) = budget {
            cap = cap.min(remaining);
        }
        if cap == 0 {
            continue;
        }

        if let Some(remaining) = budget.as_mut() {
            *remaining -= cap;
        }
        applied_total = applied_total.saturating_add(cap);

        let consumed_after = match counter {
            Some(post) => {
                if !pending.contains_key(&post) {
                    expected.push((post, entry.stored_consumed));
                }
                *pending.entry(post).or_insert(0) += cap;
                deltas.push((post, cap));
                consumed.saturating_add(cap)
            }
            None => 0,
        };

        let key = entry.context.context_key();
        if key.is_empty() {
            continue;
        }
        let snapshot = ContextSnapshot::new(
            QuotaSnapshot::new(entry.limit_seconds, consumed_after),
            &entry.context,
        );
        match snapshots.iter_mut().find(|s| s.key == key) {
            Some(existing) => *existing = snapshot,
            None => snapshots.push(snapshot),
        }
    }

    let legacy_cap = if limited {
        legacy_seconds.min(global.limit_seconds.saturating_sub(original))
    } else {
        legacy_seconds
    };
    applied_total = applied_total.max(legacy_cap);

    let global_after = match (applied_total, limited) {
        (0, _) => original,
        (_, true) => global.limit_seconds.min(original.saturating_add(applied_total)),
        (_, false) => original.saturating_add(applied_total),
    };

    AllocationPlan {
        commit: UsageCommit {
            expected_global: original,
            expected_contexts: expected,
            context_deltas: deltas,
            global_seconds: (applied_total > 0).then_some(global_after),
        },
        contexts: snapshots,
        applied_total,
        global_after,
    }
}

/// Applies usage batches for authenticated users.
#[derive(Debug, Clone)]
pub struct UsageAllocator {
    store: Arc<dyn QuotaStore>,
    resolver: Arc<LimitResolver>,
    locks: UserLocks,
}

impl UsageAllocator {
    /// Creates a new allocator sharing `locks` with other ledger writers.
    pub fn new(store: Arc<dyn QuotaStore>, resolver: Arc<LimitResolver>, locks: UserLocks) -> Self {
        Self {
            store,
            resolver,
            locks,
        }
    }

    /// Applies a batch for `user` and returns the updated snapshots.
    pub async fn apply(&self, user: UserId, report: &UsageReport) -> AppResult<UsageOutcome> {
        let _guard = self.locks.acquire(user).await;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            if let Some(outcome) = self.try_apply(user, report).await? {
                return Ok(outcome);
            }
            debug!(user_id = %user, attempt, "Ledger moved during commit, re-planning");
        }

        Err(AppError::store_unavailable(format!(
            "Ledger for user {user} kept changing; gave up after {MAX_COMMIT_ATTEMPTS} attempts"
        )))
    }

    /// One read-plan-commit pass. `None` when the commit was rejected.
    async fn try_apply(
        &self,
        user: UserId,
        report: &UsageReport,
    ) -> AppResult<Option<UsageOutcome>> {
        let global_limit = self.resolver.resolve_global(user).await?;
        let global_consumed = self.store.get_global(user).await?;
        let ledger = GlobalLedger {
            limit_seconds: global_limit,
            consumed_seconds: global_consumed,
        };

        if report.is_noop() || (global_limit > 0 && global_consumed >= global_limit) {
            debug!(user_id = %user, "Usage batch applied nothing");
            return Ok(Some(UsageOutcome {
                global: QuotaSnapshot::new(global_limit, global_consumed),
                contexts: Vec::new(),
                applied_seconds: 0,
            }));
        }

        let entries = self.read_entries(user, &report.entries).await?;
        let plan = plan_allocation(ledger, report.legacy_seconds, &entries);

        if !plan.commit.is_empty()
            && self.store.commit(user, &plan.commit).await? == CommitOutcome::Conflict
        {
            return Ok(None);
        }

        if plan.applied_total > 0 {
            info!(
                user_id = %user,
                applied = plan.applied_total,
                contexts = plan.commit.context_deltas.len(),
                global_consumed = plan.global_after,
                global_limit,
                "Applied watch time"
            );
        } else {
            debug!(user_id = %user, "Usage batch applied nothing");
        }

        Ok(Some(UsageOutcome {
            global: QuotaSnapshot::new(global_limit, plan.global_after),
            contexts: plan.contexts,
            applied_seconds: plan.applied_total,
        }))
    }

    /// Resolves limits and reads stored counters for every positive entry.
    async fn read_entries(
        &self,
        user: UserId,
        entries: &[UsageEntry],
    ) -> AppResult<Vec<PlannedEntry>> {
        let mut stored: HashMap<PostId, u64> = HashMap::new();
        let mut planned = Vec::with_capacity(entries.len());

        for entry in entries.iter().filter(|e| e.seconds > 0) {
            let limit_seconds = self.resolver.resolve(user, &entry.context).await?;
            let stored_consumed = match entry.context.counter_post() {
                Some(post) => match stored.get(&post) {
                    Some(value) => *value,
                    None => {
                        let value = self.store.get(user, post).await?;
                        stored.insert(post, value);
                        value
                    }
                },
                None => 0,
            };
            planned.push(PlannedEntry {
                context: entry.context.clone(),
                proposed: entry.seconds,
                limit_seconds,
                stored_consumed,
            });
        }

        Ok(planned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtime_core::types::CourseId;

    fn entry(post: u64, proposed: u64, limit: u64, stored: u64) -> PlannedEntry {
        PlannedEntry {
            context: ContentContext::for_post(PostId(post)),
            proposed,
            limit_seconds: limit,
            stored_consumed: stored,
        }
    }

    fn ledger(limit: u64, consumed: u64) -> GlobalLedger {
        GlobalLedger {
            limit_seconds: limit,
            consumed_seconds: consumed,
        }
    }

    #[test]
    fn test_global_cap_serves_entries_in_order() {
        let plan = plan_allocation(
            ledger(100, 90),
            0,
            &[entry(1, 5, 0, 0), entry(2, 20, 0, 0)],
        );
        assert_eq!(
            plan.commit.context_deltas,
            vec![(PostId(1), 5), (PostId(2), 5)]
        );
        assert_eq!(plan.applied_total, 10);
        assert_eq!(plan.commit.global_seconds, Some(100));
    }

    #[test]
    fn test_context_cap_binds_before_global() {
        let plan = plan_allocation(ledger(1000, 0), 0, &[entry(1, 50, 10, 8)]);
        assert_eq!(plan.commit.context_deltas, vec![(PostId(1), 2)]);
        assert_eq!(plan.global_after, 2);
        let snap = &plan.contexts[0];
        assert!(snap.snapshot.is_exhausted());
        assert_eq!(snap.snapshot.consumed_seconds, 10);
    }

    #[test]
    fn test_legacy_and_entries_take_the_max() {
        let plan = plan_allocation(ledger(0, 0), 30, &[entry(1, 10, 0, 0)]);
        assert_eq!(plan.applied_total, 30);
        assert_eq!(plan.global_after, 30);
        assert_eq!(plan.commit.context_deltas, vec![(PostId(1), 10)]);

        let plan = plan_allocation(ledger(0, 0), 5, &[entry(1, 10, 0, 0)]);
        assert_eq!(plan.applied_total, 10);
    }

    #[test]
    fn test_legacy_is_capped_by_original_budget() {
        let plan = plan_allocation(ledger(100, 80), 500, &[]);
        assert_eq!(plan.applied_total, 20);
        assert_eq!(plan.commit.global_seconds, Some(100));
        assert!(plan.commit.context_deltas.is_empty());
    }

    #[test]
    fn test_exhausted_global_writes_nothing() {
        let plan = plan_allocation(ledger(100, 100), 10, &[entry(1, 10, 0, 0)]);
        assert!(plan.commit.is_empty());
        assert!(plan.contexts.is_empty());
        assert_eq!(plan.global_after, 100);
    }

    #[test]
    fn test_unlimited_context_capped_by_global() {
        let plan = plan_allocation(ledger(10_800, 10_750), 0, &[entry(1, 100, 0, 0)]);
        assert_eq!(plan.commit.context_deltas, vec![(PostId(1), 50)]);
        assert_eq!(plan.global_after, 10_800);
        let snap = &plan.contexts[0].snapshot;
        assert!(!snap.enforced);
        assert_eq!(snap.consumed_seconds, 50);
    }

    #[test]
    fn test_repeated_post_sees_earlier_grants() {
        let plan = plan_allocation(
            ledger(0, 0),
            0,
            &[entry(7, 6, 10, 0), entry(7, 6, 10, 0)],
        );
        assert_eq!(
            plan.commit.context_deltas,
            vec![(PostId(7), 6), (PostId(7), 4)]
        );
        assert_eq!(plan.contexts.len(), 1);
        assert_eq!(plan.contexts[0].snapshot.consumed_seconds, 10);
    }

    #[test]
    fn test_snapshot_order_is_first_seen_with_last_values() {
        let plan = plan_allocation(
            ledger(0, 0),
            0,
            &[entry(1, 5, 0, 0), entry(2, 5, 0, 0), entry(1, 3, 0, 0)],
        );
        let keys: Vec<_> = plan.contexts.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["post-1", "post-2"]);
        assert_eq!(plan.contexts[0].snapshot.consumed_seconds, 8);
    }

    #[test]
    fn test_course_only_context_counts_globally_without_counter() {
        let course_only = PlannedEntry {
            context: ContentContext {
                course_id: Some(CourseId(3)),
                ..Default::default()
            },
            proposed: 12,
            limit_seconds: 0,
            stored_consumed: 0,
        };
        let plan = plan_allocation(ledger(0, 0), 0, &[course_only]);
        assert!(plan.commit.context_deltas.is_empty());
        assert_eq!(plan.commit.global_seconds, Some(12));
        assert_eq!(plan.contexts[0].key, "course-3");
        assert_eq!(plan.contexts[0].post_id, None);
    }

    #[test]
    fn test_empty_context_gets_no_snapshot() {
        let empty = PlannedEntry {
            context: ContentContext::default(),
            proposed: 4,
            limit_seconds: 0,
            stored_consumed: 0,
        };
        let plan = plan_allocation(ledger(0, 0), 0, &[empty]);
        assert!(plan.contexts.is_empty());
        assert_eq!(plan.applied_total, 4);
    }

    #[test]
    fn test_zero_proposals_are_dropped() {
        let plan = plan_allocation(ledger(0, 0), 0, &[entry(1, 0, 0, 0)]);
        assert_eq!(plan, AllocationPlan::default());
    }

    #[test]
    fn test_enforced_contexts_sum_to_limit() {
        let plan = plan_allocation(
            ledger(0, 0),
            0,
            &[entry(1, 7, 60, 20), entry(2, 100, 30, 0)],
        );
        for snap in &plan.contexts {
            let s = snap.snapshot;
            assert_eq!(s.consumed_seconds + s.remaining_seconds, s.limit_seconds);
        }
    }

    mod shared_store {
        use super::*;
        use std::sync::Mutex;

        use async_trait::async_trait;
        use watchtime_core::config::QuotaConfig;
        use watchtime_core::traits::store::ContextUsage;
        use watchtime_store::memory::{MemoryCatalog, MemoryQuotaStore};

        /// A write made by another process between our read and commit.
        #[derive(Debug, Clone, Copy)]
        enum Interleaved {
            Usage { post: PostId, seconds: u64 },
            Reset,
        }

        /// Memory store that lets another writer act once, right before
        /// the first commit reaches the ledger.
        #[derive(Debug)]
        struct InterleavedStore {
            inner: MemoryQuotaStore,
            pending: Mutex<Option<Interleaved>>,
        }

        #[async_trait]
        impl QuotaStore for InterleavedStore {
            async fn get(&self, user: UserId, post: PostId) -> AppResult<u64> {
                self.inner.get(user, post).await
            }

            async fn get_global(&self, user: UserId) -> AppResult<u64> {
                self.inner.get_global(user).await
            }

            async fn increment(&self, user: UserId, post: PostId, delta: u64) -> AppResult<u64> {
                self.inner.increment(user, post, delta).await
            }

            async fn increment_global(&self, user: UserId, delta: u64) -> AppResult<u64> {
                self.inner.increment_global(user, delta).await
            }

            async fn set_global(&self, user: UserId, seconds: u64) -> AppResult<()> {
                self.inner.set_global(user, seconds).await
            }

            async fn commit(
                &self,
                user: UserId,
                commit: &UsageCommit,
            ) -> AppResult<CommitOutcome> {
                let interleaved = self.pending.lock().unwrap().take();
                match interleaved {
                    Some(Interleaved::Usage { post, seconds }) => {
                        self.inner.increment(user, post, seconds).await?;
                        self.inner.increment_global(user, seconds).await?;
                    }
                    Some(Interleaved::Reset) => {
                        self.inner.reset_user(user, None).await?;
                    }
                    None => {}
                }
                self.inner.commit(user, commit).await
            }

            async fn usage_for_user(&self, user: UserId) -> AppResult<Vec<ContextUsage>> {
                self.inner.usage_for_user(user).await
            }

            async fn reset_user(&self, user: UserId, posts: Option<&[PostId]>) -> AppResult<u64> {
                self.inner.reset_user(user, posts).await
            }

            async fn tracked_users(&self) -> AppResult<Vec<UserId>> {
                self.inner.tracked_users().await
            }

            async fn health_check(&self) -> AppResult<bool> {
                Ok(true)
            }
        }

        const USER: UserId = UserId(5);

        fn allocator(
            default_minutes: u32,
            interleaved: Interleaved,
        ) -> (UsageAllocator, MemoryQuotaStore) {
            let catalog = Arc::new(MemoryCatalog::new());
            let config = QuotaConfig {
                default_limit_minutes: default_minutes,
                ..QuotaConfig::default()
            };
            let resolver = Arc::new(LimitResolver::new(
                catalog.clone(),
                catalog.clone(),
                catalog,
                &config,
            ));
            let inner = MemoryQuotaStore::new();
            let store = InterleavedStore {
                inner: inner.clone(),
                pending: Mutex::new(Some(interleaved)),
            };
            (
                UsageAllocator::new(Arc::new(store), resolver, UserLocks::new()),
                inner,
            )
        }

        fn report(post: u64, seconds: u64) -> UsageReport {
            UsageReport {
                legacy_seconds: 0,
                entries: vec![UsageEntry {
                    context: ContentContext::for_post(PostId(post)),
                    seconds,
                }],
            }
        }

        #[tokio::test]
        async fn test_other_writer_cannot_push_past_global_cap() {
            let (allocator, ledger) = allocator(
                1,
                Interleaved::Usage {
                    post: PostId(1),
                    seconds: 50,
                },
            );

            let outcome = allocator.apply(USER, &report(1, 40)).await.unwrap();

            assert_eq!(outcome.applied_seconds, 10);
            assert_eq!(outcome.global.consumed_seconds, 60);
            assert_eq!(ledger.get_global(USER).await.unwrap(), 60);
            assert_eq!(ledger.get(USER, PostId(1)).await.unwrap(), 60);
        }

        #[tokio::test]
        async fn test_reset_during_apply_is_not_undone() {
            let (allocator, ledger) = allocator(0, Interleaved::Reset);
            ledger.increment(USER, PostId(2), 300).await.unwrap();
            ledger.set_global(USER, 300).await.unwrap();

            let outcome = allocator.apply(USER, &report(2, 20)).await.unwrap();

            assert_eq!(outcome.applied_seconds, 20);
            assert_eq!(ledger.get_global(USER).await.unwrap(), 20);
            assert_eq!(ledger.get(USER, PostId(2)).await.unwrap(), 20);
        }
    }

    #[test]
    fn test_plan_records_what_it_read() {
        let plan = plan_allocation(
            ledger(0, 40),
            0,
            &[entry(3, 5, 0, 12), entry(3, 5, 0, 12), entry(4, 0, 0, 9)],
        );
        assert_eq!(plan.commit.expected_global, 40);
        assert_eq!(plan.commit.expected_contexts, vec![(PostId(3), 12)]);
    }
}
