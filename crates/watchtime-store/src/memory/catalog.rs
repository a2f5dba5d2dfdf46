//! In-process catalog of posts, courses, users, and settings.
//!
//! Backs single-node deployments without a database and every test suite
//! in the workspace.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use watchtime_core::error::AppError;
use watchtime_core::result::AppResult;
use watchtime_core::traits::catalog::{ContentCatalog, SettingsStore, UserDirectory};
use watchtime_core::types::{Course, CourseId, PostId, UserId, UserProfile};

#[derive(Debug, Clone)]
struct PostRecord {
    title: String,
    course_id: Option<CourseId>,
    limit_minutes: u32,
}

#[derive(Debug, Clone)]
struct UserRecord {
    profile: UserProfile,
    limit_seconds: u64,
}

/// In-memory implementation of all catalog traits.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    posts: Arc<DashMap<PostId, PostRecord>>,
    courses: Arc<DashMap<CourseId, String>>,
    enrollments: Arc<DashMap<CourseId, BTreeSet<UserId>>>,
    users: Arc<DashMap<UserId, UserRecord>>,
    default_limit: Arc<RwLock<Option<i64>>>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a post.
    pub fn insert_post(&self, id: PostId, title: impl Into<String>, course: Option<CourseId>) {
        let limit_minutes = self.posts.get(&id).map(|p| p.limit_minutes).unwrap_or(0);
        self.posts.insert(
            id,
            PostRecord {
                title: title.into(),
                course_id: course,
                limit_minutes,
            },
        );
    }

    /// Adds or replaces a course.
    pub fn insert_course(&self, id: CourseId, title: impl Into<String>) {
        self.courses.insert(id, title.into());
    }

    /// Adds or replaces a user, keeping any existing limit override.
    pub fn insert_user(&self, profile: UserProfile) {
        let limit_seconds = self
            .users
            .get(&profile.id)
            .map(|u| u.limit_seconds)
            .unwrap_or(0);
        self.users.insert(
            profile.id,
            UserRecord {
                profile,
                limit_seconds,
            },
        );
    }

    /// Enrolls a user in a course.
    pub fn enroll(&self, course: CourseId, user: UserId) {
        self.enrollments.entry(course).or_default().insert(user);
    }
}

#[async_trait]
impl ContentCatalog for MemoryCatalog {
    async fn limit_override_minutes(&self, post: PostId) -> AppResult<u32> {
        Ok(self.posts.get(&post).map(|p| p.limit_minutes).unwrap_or(0))
    }

    async fn set_limit_override_minutes(
        &self,
        post: PostId,
        minutes: Option<u32>,
    ) -> AppResult<()> {
        let mut record = self
            .posts
            .get_mut(&post)
            .ok_or_else(|| AppError::not_found(format!("Post {post} not found")))?;
        record.limit_minutes = minutes.unwrap_or(0);
        Ok(())
    }

    async fn course_of(&self, post: PostId) -> AppResult<Option<CourseId>> {
        Ok(self.posts.get(&post).and_then(|p| p.course_id))
    }

    async fn post_title(&self, post: PostId) -> AppResult<Option<String>> {
        Ok(self.posts.get(&post).map(|p| p.title.clone()))
    }

    async fn course_title(&self, course: CourseId) -> AppResult<Option<String>> {
        Ok(self.courses.get(&course).map(|c| c.clone()))
    }

    async fn list_courses(&self) -> AppResult<Vec<Course>> {
        let mut courses: Vec<Course> = self
            .courses
            .iter()
            .map(|entry| Course {
                id: *entry.key(),
                title: entry.value().clone(),
            })
            .collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(courses)
    }

    async fn user_ids_in_course(&self, course: CourseId) -> AppResult<Vec<UserId>> {
        Ok(self
            .enrollments
            .get(&course)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl UserDirectory for MemoryCatalog {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.users.get(&id).map(|u| u.profile.clone()))
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<UserProfile>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.profile.user_login == login)
            .map(|u| u.profile.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.profile.user_email.eq_ignore_ascii_case(email))
            .map(|u| u.profile.clone()))
    }

    async fn find_many(&self, ids: &[UserId]) -> AppResult<Vec<UserProfile>> {
        let mut profiles: Vec<UserProfile> = ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| self.users.get(id).map(|u| u.profile.clone()))
            .collect();
        profiles.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));
        Ok(profiles)
    }

    async fn limit_override_seconds(&self, user: UserId) -> AppResult<u64> {
        Ok(self.users.get(&user).map(|u| u.limit_seconds).unwrap_or(0))
    }

    async fn set_limit_override_seconds(
        &self,
        user: UserId,
        seconds: Option<u64>,
    ) -> AppResult<()> {
        let mut record = self
            .users
            .get_mut(&user)
            .ok_or_else(|| AppError::not_found(format!("User {user} not found")))?;
        record.limit_seconds = seconds.unwrap_or(0);
        Ok(())
    }

    async fn users_with_limit_override(&self) -> AppResult<Vec<UserId>> {
        let mut ids: Vec<UserId> = self
            .users
            .iter()
            .filter(|u| u.limit_seconds > 0)
            .map(|u| *u.key())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl SettingsStore for MemoryCatalog {
    async fn default_limit_minutes(&self) -> AppResult<Option<i64>> {
        Ok(*self.default_limit.read().await)
    }

    async fn set_default_limit_minutes(&self, minutes: u32) -> AppResult<()> {
        *self.default_limit.write().await = Some(i64::from(minutes));
        Ok(())
    }
}
