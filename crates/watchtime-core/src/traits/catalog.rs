//! Collaborator traits for content metadata, user accounts, and settings.
//!
//! The quota core reads these but does not own the data behind them.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::{CourseId, PostId, UserId};
use crate::types::profile::{Course, UserProfile};

/// Content metadata and course membership.
#[async_trait]
pub trait ContentCatalog: Send + Sync + std::fmt::Debug + 'static {
    /// Per-content limit override in minutes (0 = none).
    async fn limit_override_minutes(&self, post: PostId) -> AppResult<u32>;

    /// Sets or clears (`None`) a per-content limit override.
    async fn set_limit_override_minutes(&self, post: PostId, minutes: Option<u32>)
    -> AppResult<()>;

    /// The course a post belongs to.
    async fn course_of(&self, post: PostId) -> AppResult<Option<CourseId>>;

    /// Title of a post; `None` when the post does not exist.
    async fn post_title(&self, post: PostId) -> AppResult<Option<String>>;

    /// Title of a course; `None` when the course does not exist.
    async fn course_title(&self, course: CourseId) -> AppResult<Option<String>>;

    /// All courses ordered by title.
    async fn list_courses(&self) -> AppResult<Vec<Course>>;

    /// Users enrolled in a course.
    async fn user_ids_in_course(&self, course: CourseId) -> AppResult<Vec<UserId>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Viewer accounts and their per-user limit overrides.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Looks a user up by id.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserProfile>>;

    /// Looks a user up by login name.
    async fn find_by_login(&self, login: &str) -> AppResult<Option<UserProfile>>;

    /// Looks a user up by email address.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>>;

    /// Profiles for the given ids, ordered by display name. Unknown ids are skipped.
    async fn find_many(&self, ids: &[UserId]) -> AppResult<Vec<UserProfile>>;

    /// Per-user limit override in seconds (0 = none).
    async fn limit_override_seconds(&self, user: UserId) -> AppResult<u64>;

    /// Sets or clears (`None`) a per-user limit override.
    async fn set_limit_override_seconds(&self, user: UserId, seconds: Option<u64>)
    -> AppResult<()>;

    /// Users that carry a per-user limit override.
    async fn users_with_limit_override(&self) -> AppResult<Vec<UserId>>;
}

/// Process-wide settings.
#[async_trait]
pub trait SettingsStore: Send + Sync + std::fmt::Debug + 'static {
    /// Stored default limit in minutes, `None` when never set.
    async fn default_limit_minutes(&self) -> AppResult<Option<i64>>;

    /// Persists the default limit in minutes.
    async fn set_default_limit_minutes(&self, minutes: u32) -> AppResult<()>;
}
