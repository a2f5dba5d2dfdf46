//! Response shapes of the admin surface.

use serde::{Deserialize, Serialize};

use watchtime_core::types::{CourseId, PostId, QuotaSnapshot, UserId, UserProfile};

/// Identity fields shown next to a user's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    pub user_login: String,
    pub user_email: String,
}

impl From<&UserProfile> for UserSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name.clone(),
            user_login: profile.user_login.clone(),
            user_email: profile.user_email.clone(),
        }
    }
}

/// A user's global ledger together with who they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserStatus {
    #[serde(flatten)]
    pub watch: QuotaSnapshot,
    pub user: UserSummary,
}

/// Entry of the watch users listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// One non-zero per-context counter in the records report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecord {
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub course_id: Option<CourseId>,
    pub course_title: String,
    pub lesson_id: PostId,
    pub lesson_title: String,
    pub consumed_minutes: u64,
    /// 0 when unlimited.
    pub limit_minutes: u64,
    /// `consumed/limit`, or `consumed/unlimited`.
    pub visualized: String,
}

/// Result of a course-wide reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseReset {
    pub reset: u64,
    pub message: String,
}

/// Result of a default-limit update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultLimit {
    pub minutes: u32,
    pub message: String,
}

/// A post's content-level override after an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentLimit {
    pub post_id: PostId,
    /// 0 when cleared.
    pub minutes: u32,
}
