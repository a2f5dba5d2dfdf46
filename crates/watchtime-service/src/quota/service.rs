//! Viewer-facing quota operations.

use std::sync::Arc;

use watchtime_core::AppError;
use watchtime_core::result::AppResult;
use watchtime_core::traits::store::QuotaStore;
use watchtime_core::types::ContentContext;

use super::allocator::{UsageAllocator, UsageOutcome, UsageReport};
use super::locks::UserLocks;
use super::resolver::LimitResolver;
use super::status::{StatusBuilder, StatusView};
use crate::context::RequestContext;

/// Status queries and usage reports for the calling viewer.
#[derive(Debug, Clone)]
pub struct QuotaService {
    status: StatusBuilder,
    allocator: UsageAllocator,
}

impl QuotaService {
    /// Creates a new quota service.
    pub fn new(store: Arc<dyn QuotaStore>, resolver: Arc<LimitResolver>, locks: UserLocks) -> Self {
        Self {
            status: StatusBuilder::new(store.clone(), resolver.clone()),
            allocator: UsageAllocator::new(store, resolver, locks),
        }
    }

    /// Current status; degrades to zero snapshots without a caller.
    pub async fn status(
        &self,
        caller: Option<&RequestContext>,
        context: &ContentContext,
    ) -> AppResult<StatusView> {
        self.status.status(caller.map(|c| c.user_id), context).await
    }

    /// Applies a usage batch; rejected without a caller.
    pub async fn apply_usage(
        &self,
        caller: Option<&RequestContext>,
        report: &UsageReport,
    ) -> AppResult<UsageOutcome> {
        let caller =
            caller.ok_or_else(|| AppError::unauthenticated("Authentication required"))?;
        self.allocator.apply(caller.user_id, report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::allocator::UsageEntry;
    use watchtime_auth::Role;
    use watchtime_core::config::QuotaConfig;
    use watchtime_core::error::ErrorKind;
    use watchtime_core::traits::catalog::{ContentCatalog, UserDirectory};
    use watchtime_core::types::{CourseId, PostId, UserId, UserProfile};
    use watchtime_store::memory::{MemoryCatalog, MemoryQuotaStore};

    struct Fixture {
        catalog: MemoryCatalog,
        store: MemoryQuotaStore,
        service: QuotaService,
    }

    fn fixture(default_minutes: u32) -> Fixture {
        let catalog = MemoryCatalog::new();
        for id in 1..=3 {
            catalog.insert_post(PostId(id), format!("Video {id}"), Some(CourseId(1)));
        }
        catalog.insert_user(UserProfile {
            id: UserId(1),
            user_login: "viewer".to_string(),
            user_email: "viewer@example.com".to_string(),
            display_name: "Viewer".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        });
        let shared = Arc::new(catalog.clone());
        let config = QuotaConfig {
            default_limit_minutes: default_minutes,
            ..QuotaConfig::default()
        };
        let resolver = Arc::new(LimitResolver::new(
            shared.clone(),
            shared.clone(),
            shared,
            &config,
        ));
        let store = MemoryQuotaStore::new();
        let service = QuotaService::new(Arc::new(store.clone()), resolver, UserLocks::new());
        Fixture {
            catalog,
            store,
            service,
        }
    }

    fn viewer() -> RequestContext {
        RequestContext::new(UserId(1), Role::Viewer)
    }

    fn report(legacy: u64, entries: &[(u64, u64)]) -> UsageReport {
        UsageReport {
            legacy_seconds: legacy,
            entries: entries
                .iter()
                .map(|(post, seconds)| UsageEntry {
                    context: ContentContext::for_post(PostId(*post)),
                    seconds: *seconds,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_apply_requires_caller() {
        let f = fixture(180);
        let err = f
            .service
            .apply_usage(None, &report(10, &[]))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Unauthenticated));
    }

    #[tokio::test]
    async fn test_noop_batch_returns_current_snapshot() {
        let f = fixture(180);
        f.store.set_global(UserId(1), 60).await.unwrap();
        let outcome = f
            .service
            .apply_usage(Some(&viewer()), &report(0, &[(1, 0)]))
            .await
            .unwrap();
        assert_eq!(outcome.applied_seconds, 0);
        assert_eq!(outcome.global.consumed_seconds, 60);
        assert!(outcome.contexts.is_empty());
    }

    #[tokio::test]
    async fn test_global_cap_scenario() {
        let f = fixture(180);
        f.store.set_global(UserId(1), 10_750).await.unwrap();

        let outcome = f
            .service
            .apply_usage(Some(&viewer()), &report(0, &[(1, 100)]))
            .await
            .unwrap();
        assert_eq!(outcome.applied_seconds, 50);
        assert_eq!(f.store.get(UserId(1), PostId(1)).await.unwrap(), 50);
        assert_eq!(f.store.get_global(UserId(1)).await.unwrap(), 10_800);

        let status = f
            .service
            .status(Some(&viewer()), &ContentContext::for_post(PostId(1)))
            .await
            .unwrap();
        assert!(status.global.enforced);
        assert_eq!(status.global.remaining_seconds, 0);
    }

    #[tokio::test]
    async fn test_content_override_caps_context() {
        let f = fixture(0);
        f.catalog
            .set_limit_override_minutes(PostId(2), Some(1))
            .await
            .unwrap();

        let outcome = f
            .service
            .apply_usage(Some(&viewer()), &report(0, &[(2, 90), (3, 15)]))
            .await
            .unwrap();
        assert_eq!(outcome.applied_seconds, 75);
        assert_eq!(outcome.contexts[0].snapshot.limit_seconds, 60);
        assert!(outcome.contexts[0].snapshot.is_exhausted());
        assert!(!outcome.global.enforced);
        assert_eq!(outcome.global.consumed_seconds, 75);
    }

    #[tokio::test]
    async fn test_user_override_sets_global_limit() {
        let f = fixture(180);
        f.catalog
            .set_limit_override_seconds(UserId(1), Some(30))
            .await
            .unwrap();

        let outcome = f
            .service
            .apply_usage(Some(&viewer()), &report(0, &[(1, 25), (2, 25)]))
            .await
            .unwrap();
        assert_eq!(outcome.applied_seconds, 30);
        assert_eq!(f.store.get(UserId(1), PostId(2)).await.unwrap(), 5);
        assert!(outcome.global.is_exhausted());
    }

    #[tokio::test]
    async fn test_concurrent_batches_hold_global_cap() {
        let f = fixture(1);
        let tasks = (0..20).map(|_| {
            let service = f.service.clone();
            tokio::spawn(async move {
                service
                    .apply_usage(Some(&viewer()), &report(0, &[(1, 7)]))
                    .await
                    .unwrap()
            })
        });
        let outcomes = futures::future::join_all(tasks).await;

        let applied: u64 = outcomes
            .into_iter()
            .map(|o| o.expect("task").applied_seconds)
            .sum();
        assert_eq!(applied, 60);
        assert_eq!(f.store.get_global(UserId(1)).await.unwrap(), 60);
        assert_eq!(f.store.get(UserId(1), PostId(1)).await.unwrap(), 60);
    }
}
