//! Limit resolution: determines the applicable limit for a user and context.
//!
//! Resolution order:
//! 1. Per-content override on the context's limit-bearing post (minutes)
//! 2. Per-user override (seconds)
//! 3. Process default (minutes, stored setting first, then configuration)
//!
//! The global ledger skips step 1. A resolved value of 0 means unlimited.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use watchtime_core::config::QuotaConfig;
use watchtime_core::result::AppResult;
use watchtime_core::traits::catalog::{ContentCatalog, SettingsStore, UserDirectory};
use watchtime_core::types::{ContentContext, PostId, UserId};

/// Resolves limits in seconds from content, user, and default tiers.
#[derive(Debug, Clone)]
pub struct LimitResolver {
    catalog: Arc<dyn ContentCatalog>,
    users: Arc<dyn UserDirectory>,
    settings: Arc<dyn SettingsStore>,
    /// Default minutes used when the settings store has none.
    fallback_default_minutes: u32,
    /// Cached per-content overrides in minutes.
    overrides: Cache<PostId, u32>,
}

impl LimitResolver {
    /// Creates a new resolver.
    pub fn new(
        catalog: Arc<dyn ContentCatalog>,
        users: Arc<dyn UserDirectory>,
        settings: Arc<dyn SettingsStore>,
        config: &QuotaConfig,
    ) -> Self {
        let overrides = Cache::builder()
            .max_capacity(config.override_cache_capacity)
            .time_to_live(Duration::from_secs(config.override_cache_ttl_seconds))
            .build();

        Self {
            catalog,
            users,
            settings,
            fallback_default_minutes: config.default_limit_minutes,
            overrides,
        }
    }

    /// Limit for a per-context ledger.
    pub async fn resolve(&self, user: UserId, context: &ContentContext) -> AppResult<u64> {
        if let Some(post) = self.limit_bearing_post(context).await? {
            let minutes = self.content_override_minutes(post).await?;
            if minutes > 0 {
                return Ok(u64::from(minutes) * 60);
            }
        }
        self.resolve_global(user).await
    }

    /// Limit for the record of a single post, as the admin report shows it.
    pub async fn resolve_for_post(&self, user: UserId, post: PostId) -> AppResult<u64> {
        self.resolve(user, &ContentContext::for_post(post)).await
    }

    /// Limit for the global ledger: user override, else default.
    pub async fn resolve_global(&self, user: UserId) -> AppResult<u64> {
        let user_seconds = self.users.limit_override_seconds(user).await?;
        if user_seconds > 0 {
            return Ok(user_seconds);
        }
        self.default_limit_seconds().await
    }

    /// The process default converted to seconds (0 = unlimited).
    pub async fn default_limit_seconds(&self) -> AppResult<u64> {
        Ok(u64::try_from(self.default_limit_minutes().await?).unwrap_or(0) * 60)
    }

    /// The process default in minutes, negative values clamped to 0.
    pub async fn default_limit_minutes(&self) -> AppResult<i64> {
        let minutes = self
            .settings
            .default_limit_minutes()
            .await?
            .unwrap_or_else(|| i64::from(self.fallback_default_minutes));
        Ok(minutes.max(0))
    }

    /// The post whose content override governs the context.
    ///
    /// The post if it carries an override, else the lesson if it does,
    /// else whichever of the two is present.
    pub async fn limit_bearing_post(&self, context: &ContentContext) -> AppResult<Option<PostId>> {
        for candidate in [context.post_id, context.lesson_id].into_iter().flatten() {
            if self.content_override_minutes(candidate).await? > 0 {
                return Ok(Some(candidate));
            }
        }
        Ok(context.post_id.or(context.lesson_id))
    }

    /// Drops the cached override for a post after it changes.
    pub async fn invalidate_content(&self, post: PostId) {
        self.overrides.invalidate(&post).await;
        debug!(post_id = %post, "Invalidated cached content limit");
    }

    async fn content_override_minutes(&self, post: PostId) -> AppResult<u32> {
        if let Some(minutes) = self.overrides.get(&post).await {
            return Ok(minutes);
        }
        let minutes = self.catalog.limit_override_minutes(post).await?;
        self.overrides.insert(post, minutes).await;
        Ok(minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtime_core::types::{CourseId, UserProfile};
    use watchtime_store::memory::MemoryCatalog;

    fn setup(default_minutes: u32) -> (MemoryCatalog, LimitResolver) {
        let catalog = MemoryCatalog::new();
        catalog.insert_post(PostId(10), "Video", None);
        catalog.insert_post(PostId(20), "Lesson", Some(CourseId(1)));
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
        let resolver = LimitResolver::new(shared.clone(), shared.clone(), shared, &config);
        (catalog, resolver)
    }

    fn context(post: Option<u64>, lesson: Option<u64>) -> ContentContext {
        ContentContext {
            post_id: post.map(PostId),
            lesson_id: lesson.map(PostId),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_default_applies_without_overrides() {
        let (_, resolver) = setup(180);
        let limit = resolver
            .resolve(UserId(1), &context(Some(10), None))
            .await
            .unwrap();
        assert_eq!(limit, 10_800);
    }

    #[tokio::test]
    async fn test_content_override_beats_user_override() {
        let (catalog, resolver) = setup(180);
        catalog
            .set_limit_override_minutes(PostId(10), Some(5))
            .await
            .unwrap();
        catalog
            .set_limit_override_seconds(UserId(1), Some(42))
            .await
            .unwrap();

        let ctx = context(Some(10), None);
        assert_eq!(resolver.resolve(UserId(1), &ctx).await.unwrap(), 300);
        assert_eq!(resolver.resolve_global(UserId(1)).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_lesson_override_used_when_post_has_none() {
        let (catalog, resolver) = setup(0);
        catalog
            .set_limit_override_minutes(PostId(20), Some(2))
            .await
            .unwrap();

        let ctx = context(Some(10), Some(20));
        assert_eq!(
            resolver.limit_bearing_post(&ctx).await.unwrap(),
            Some(PostId(20))
        );
        assert_eq!(resolver.resolve(UserId(1), &ctx).await.unwrap(), 120);
    }

    #[tokio::test]
    async fn test_limit_bearing_post_falls_back_to_present_id() {
        let (_, resolver) = setup(0);
        assert_eq!(
            resolver
                .limit_bearing_post(&context(Some(10), Some(20)))
                .await
                .unwrap(),
            Some(PostId(10))
        );
        assert_eq!(
            resolver
                .limit_bearing_post(&context(None, None))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_stored_default_overrides_configuration() {
        let (catalog, resolver) = setup(180);
        catalog.set_default_limit_minutes(0).await.unwrap();
        assert_eq!(resolver.resolve_global(UserId(1)).await.unwrap(), 0);
        catalog.set_default_limit_minutes(30).await.unwrap();
        assert_eq!(resolver.resolve_global(UserId(1)).await.unwrap(), 1_800);
    }

    #[tokio::test]
    async fn test_invalidate_picks_up_new_override() {
        let (catalog, resolver) = setup(0);
        let ctx = context(Some(10), None);
        assert_eq!(resolver.resolve(UserId(1), &ctx).await.unwrap(), 0);

        catalog
            .set_limit_override_minutes(PostId(10), Some(1))
            .await
            .unwrap();
        resolver.invalidate_content(PostId(10)).await;
        assert_eq!(resolver.resolve(UserId(1), &ctx).await.unwrap(), 60);
    }
}
