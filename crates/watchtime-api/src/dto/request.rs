//! Request DTOs with validation.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use validator::Validate;

use watchtime_core::types::ContentContext;
use watchtime_service::quota::{UsageEntry, UsageReport};

/// Longest span a single report may claim.
const MAX_REPORT_SECONDS: i64 = 86_400;

/// Usage report body: the legacy scalar plus itemized entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UsageRequest {
    /// Scalar total sent by older clients.
    #[serde(default)]
    #[validate(range(max = MAX_REPORT_SECONDS))]
    pub seconds: i64,
    /// Itemized entries.
    #[serde(default)]
    #[validate(length(max = 200), nested)]
    pub entries: Vec<UsageEntryRequest>,
}

/// One itemized entry.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UsageEntryRequest {
    /// Where the seconds were watched. A malformed context reads as empty.
    #[serde(default, deserialize_with = "lenient_context")]
    pub context: ContentContext,
    /// Seconds watched since the last report.
    #[validate(range(max = MAX_REPORT_SECONDS))]
    pub seconds: i64,
}

impl UsageRequest {
    /// Converts the body into an allocator report.
    ///
    /// Negative values clamp to 0; zero entries are dropped.
    pub fn into_report(self) -> UsageReport {
        UsageReport {
            legacy_seconds: clamp_seconds(self.seconds),
            entries: self
                .entries
                .into_iter()
                .filter(|e| e.seconds > 0)
                .map(|e| UsageEntry {
                    context: e.context,
                    seconds: clamp_seconds(e.seconds),
                })
                .collect(),
        }
    }
}

fn clamp_seconds(seconds: i64) -> u64 {
    u64::try_from(seconds).unwrap_or(0)
}

fn lenient_context<'de, D>(deserializer: D) -> Result<ContentContext, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(ContentContext::from_value(value).unwrap_or_else(|e| {
        debug!(error = %e, "Treating usage entry context as empty");
        ContentContext::default()
    }))
}

/// Query for the watch users listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchUsersQuery {
    /// Restrict to users enrolled in this course.
    pub course_id: Option<u64>,
    /// Case-insensitive search over login, email, and display name.
    pub search: Option<String>,
}

/// Query for the records report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsQuery {
    /// Restrict to counters on this course's posts.
    pub course_id: Option<u64>,
    /// Restrict to this user's counters.
    pub user_id: Option<u64>,
}

/// Course reset body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResetRequest {
    /// Users to reset; empty means every enrolled user.
    #[serde(default)]
    pub user_ids: Vec<u64>,
}

/// Default limit body. Negative minutes clamp to 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLimitRequest {
    /// New default in minutes (0 = unlimited).
    pub minutes: i64,
}

/// Per-user override body; absent or 0 clears the override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserLimitRequest {
    /// Limit in seconds.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub seconds: Option<i64>,
}

/// Per-content override body; absent or 0 clears the override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ContentLimitRequest {
    /// Limit in minutes.
    #[serde(default)]
    #[validate(range(min = 0, max = 525_600))]
    pub minutes: Option<i64>,
}
