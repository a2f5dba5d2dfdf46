//! Admin quota service: user lookups, resets, reports, and limit management.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use watchtime_core::AppError;
use watchtime_core::result::AppResult;
use watchtime_core::traits::catalog::{ContentCatalog, SettingsStore, UserDirectory};
use watchtime_core::traits::store::QuotaStore;
use watchtime_core::types::{Course, CourseId, PostId, QuotaSnapshot, UserId, UserProfile};

use super::records::{ceil_minutes, visualized};
use super::views::{
    AdminUserStatus, ContentLimit, CourseReset, DefaultLimit, UserSummary, WatchRecord, WatchUser,
};
use crate::context::RequestContext;
use crate::quota::{LimitResolver, UserLocks};

/// Most users returned by an unfiltered watch users listing.
const WATCH_USERS_LIMIT: usize = 50;

/// Handles administrative quota operations.
#[derive(Debug, Clone)]
pub struct AdminQuotaService {
    store: Arc<dyn QuotaStore>,
    catalog: Arc<dyn ContentCatalog>,
    users: Arc<dyn UserDirectory>,
    settings: Arc<dyn SettingsStore>,
    resolver: Arc<LimitResolver>,
    locks: UserLocks,
}

impl AdminQuotaService {
    /// Creates a new admin quota service.
    pub fn new(
        store: Arc<dyn QuotaStore>,
        catalog: Arc<dyn ContentCatalog>,
        users: Arc<dyn UserDirectory>,
        settings: Arc<dyn SettingsStore>,
        resolver: Arc<LimitResolver>,
        locks: UserLocks,
    ) -> Self {
        Self {
            store,
            catalog,
            users,
            settings,
            resolver,
            locks,
        }
    }

    /// Finds a user by numeric id, then login, then email.
    pub async fn find_user(&self, identifier: &str) -> AppResult<UserProfile> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AppError::validation("A user identifier is required"));
        }

        if let Some(id) = identifier.parse::<u64>().ok().and_then(UserId::new)
            && let Some(user) = self.users.find_by_id(id).await?
        {
            return Ok(user);
        }
        if let Some(user) = self.users.find_by_login(identifier).await? {
            return Ok(user);
        }
        if identifier.contains('@')
            && let Some(user) = self.users.find_by_email(identifier).await?
        {
            return Ok(user);
        }

        Err(AppError::not_found("User not found"))
    }

    /// A user's global ledger.
    pub async fn user_status(
        &self,
        ctx: &RequestContext,
        identifier: &str,
    ) -> AppResult<AdminUserStatus> {
        Self::require_admin(ctx)?;
        let user = self.find_user(identifier).await?;
        self.status_of(&user).await
    }

    /// Zeroes a user's global ledger and removes every context counter.
    pub async fn reset_user(
        &self,
        ctx: &RequestContext,
        identifier: &str,
    ) -> AppResult<AdminUserStatus> {
        Self::require_admin(ctx)?;
        let user = self.find_user(identifier).await?;

        let removed = {
            let _guard = self.locks.acquire(user.id).await;
            self.store.reset_user(user.id, None).await?
        };

        info!(
            admin_id = %ctx.user_id,
            user_id = %user.id,
            removed,
            "Reset user watch time"
        );
        self.status_of(&user).await
    }

    /// All courses ordered by title.
    pub async fn list_courses(&self, ctx: &RequestContext) -> AppResult<Vec<Course>> {
        Self::require_admin(ctx)?;
        self.catalog.list_courses().await
    }

    /// Users enrolled in a course, ordered by display name.
    pub async fn course_users(
        &self,
        ctx: &RequestContext,
        course: u64,
    ) -> AppResult<Vec<UserSummary>> {
        Self::require_admin(ctx)?;
        let course = Self::course_id(course)?;
        let ids = self.catalog.user_ids_in_course(course).await?;
        let profiles = self.users.find_many(&ids).await?;
        Ok(profiles.iter().map(UserSummary::from).collect())
    }

    /// Resets the given users, or every enrolled user, for one course.
    ///
    /// Each user's global ledger is zeroed; only context counters whose
    /// post belongs to the course are removed.
    pub async fn reset_course(
        &self,
        ctx: &RequestContext,
        course: u64,
        user_ids: &[u64],
    ) -> AppResult<CourseReset> {
        Self::require_admin(ctx)?;
        let course = Self::course_id(course)?;

        let mut targets: Vec<UserId> = user_ids
            .iter()
            .filter_map(|id| UserId::new(*id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if targets.is_empty() {
            targets = self.catalog.user_ids_in_course(course).await?;
        }
        if targets.is_empty() {
            return Ok(CourseReset {
                reset: 0,
                message: "No enrolled users found in the course.".to_string(),
            });
        }

        let mut reset = 0u64;
        for user in &targets {
            let _guard = self.locks.acquire(*user).await;
            let posts = self.course_posts_of(*user, course).await?;
            self.store.reset_user(*user, Some(&posts)).await?;
            reset += 1;
        }

        info!(
            admin_id = %ctx.user_id,
            course_id = %course,
            reset,
            "Reset course watch time"
        );
        let message = if reset == 1 {
            "1 user has been reset.".to_string()
        } else {
            format!("{reset} users have been reset.")
        };
        Ok(CourseReset { reset, message })
    }

    /// Users with watch activity or limits, optionally filtered.
    ///
    /// With a course, the enrolled users; otherwise users with a ledger or
    /// a per-user override, capped at 50.
    pub async fn watch_users(
        &self,
        ctx: &RequestContext,
        course: Option<CourseId>,
        search: Option<&str>,
    ) -> AppResult<Vec<WatchUser>> {
        Self::require_admin(ctx)?;

        let (ids, cap) = match course {
            Some(course) => (self.catalog.user_ids_in_course(course).await?, usize::MAX),
            None => {
                let mut ids: BTreeSet<UserId> =
                    self.store.tracked_users().await?.into_iter().collect();
                ids.extend(self.users.users_with_limit_override().await?);
                (ids.into_iter().collect(), WATCH_USERS_LIMIT)
            }
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let search = search.unwrap_or_default();
        Ok(self
            .users
            .find_many(&ids)
            .await?
            .into_iter()
            .filter(|user| user.matches_search(search))
            .take(cap)
            .map(|user| WatchUser {
                id: user.id,
                name: user.full_name(),
                email: user.user_email,
            })
            .collect())
    }

    /// Non-zero context counters for a user or a course.
    pub async fn records(
        &self,
        ctx: &RequestContext,
        user: Option<UserId>,
        course: Option<CourseId>,
    ) -> AppResult<Vec<WatchRecord>> {
        Self::require_admin(ctx)?;

        let users: Vec<UserProfile> = match (user, course) {
            (None, None) => {
                return Err(AppError::validation(
                    "Select a course or a user to continue",
                ));
            }
            (Some(user), _) => self.users.find_by_id(user).await?.into_iter().collect(),
            (None, Some(course)) => {
                let ids = self.catalog.user_ids_in_course(course).await?;
                self.users.find_many(&ids).await?
            }
        };

        let mut records = Vec::new();
        for user in &users {
            records.extend(self.user_records(user, course).await?);
        }
        Ok(records)
    }

    /// Persists a new default limit; negative minutes clamp to 0.
    pub async fn set_default_limit(
        &self,
        ctx: &RequestContext,
        minutes: i64,
    ) -> AppResult<DefaultLimit> {
        Self::require_admin(ctx)?;
        let minutes = u32::try_from(minutes.max(0)).unwrap_or(u32::MAX);
        self.settings.set_default_limit_minutes(minutes).await?;

        info!(admin_id = %ctx.user_id, minutes, "Updated default watch limit");
        Ok(DefaultLimit {
            minutes,
            message: "The default limit has been updated.".to_string(),
        })
    }

    /// Sets (`Some(n > 0)`) or clears a per-user limit override.
    pub async fn set_user_limit(
        &self,
        ctx: &RequestContext,
        user: UserId,
        seconds: Option<u64>,
    ) -> AppResult<AdminUserStatus> {
        Self::require_admin(ctx)?;
        let profile = self
            .users
            .find_by_id(user)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let seconds = seconds.filter(|s| *s > 0);
        self.users.set_limit_override_seconds(user, seconds).await?;

        info!(admin_id = %ctx.user_id, user_id = %user, seconds = ?seconds, "Updated user watch limit");
        self.status_of(&profile).await
    }

    /// Sets (`Some(n > 0)`) or clears a per-content limit override.
    pub async fn set_content_limit(
        &self,
        ctx: &RequestContext,
        post: PostId,
        minutes: Option<u32>,
    ) -> AppResult<ContentLimit> {
        Self::require_admin(ctx)?;
        if self.catalog.post_title(post).await?.is_none() {
            return Err(AppError::not_found(format!("Post {post} not found")));
        }

        let minutes = minutes.filter(|m| *m > 0);
        self.catalog.set_limit_override_minutes(post, minutes).await?;
        self.resolver.invalidate_content(post).await;

        info!(admin_id = %ctx.user_id, post_id = %post, minutes = ?minutes, "Updated content watch limit");
        Ok(ContentLimit {
            post_id: post,
            minutes: minutes.unwrap_or(0),
        })
    }

    async fn status_of(&self, user: &UserProfile) -> AppResult<AdminUserStatus> {
        let limit = self.resolver.resolve_global(user.id).await?;
        let consumed = self.store.get_global(user.id).await?;
        Ok(AdminUserStatus {
            watch: QuotaSnapshot::new(limit, consumed),
            user: UserSummary::from(user),
        })
    }

    /// The user's counter posts that belong to `course`.
    async fn course_posts_of(&self, user: UserId, course: CourseId) -> AppResult<Vec<PostId>> {
        let mut posts = Vec::new();
        for usage in self.store.usage_for_user(user).await? {
            if self.catalog.course_of(usage.post_id).await? == Some(course) {
                posts.push(usage.post_id);
            }
        }
        Ok(posts)
    }

    async fn user_records(
        &self,
        user: &UserProfile,
        course_filter: Option<CourseId>,
    ) -> AppResult<Vec<WatchRecord>> {
        let mut records = Vec::new();

        for usage in self.store.usage_for_user(user.id).await? {
            let course = self.catalog.course_of(usage.post_id).await?;
            if course_filter.is_some() && course != course_filter {
                continue;
            }
            let Some(lesson_title) = self.catalog.post_title(usage.post_id).await? else {
                continue;
            };
            let course_title = match course {
                Some(course) => self.catalog.course_title(course).await?,
                None => None,
            };

            let limit = self.resolver.resolve_for_post(user.id, usage.post_id).await?;
            let consumed_minutes = ceil_minutes(usage.seconds);
            let limit_minutes = if limit > 0 { ceil_minutes(limit) } else { 0 };

            records.push(WatchRecord {
                user_id: user.id,
                user_name: user.full_name(),
                user_email: user.user_email.clone(),
                course_id: course,
                course_title: course_title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "No course".to_string()),
                lesson_id: usage.post_id,
                lesson_title: if lesson_title.trim().is_empty() {
                    "No data".to_string()
                } else {
                    lesson_title
                },
                consumed_minutes,
                limit_minutes,
                visualized: visualized(consumed_minutes, limit_minutes),
            });
        }

        Ok(records)
    }

    fn course_id(course: u64) -> AppResult<CourseId> {
        CourseId::new(course).ok_or_else(|| AppError::validation("Invalid course"))
    }

    fn require_admin(ctx: &RequestContext) -> AppResult<()> {
        if ctx.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Insufficient permissions"))
        }
    }
}
