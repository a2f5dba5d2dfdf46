//! Read-only quota views returned by status queries and usage updates.

use serde::{Deserialize, Serialize};

use super::context::ContentContext;
use super::id::{CourseId, PostId};

/// Snapshot of a single ledger against its limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    /// Whether a non-zero limit applies.
    pub enforced: bool,
    /// The applicable limit in seconds (0 = unlimited).
    pub limit_seconds: u64,
    /// Consumed seconds, clamped to the limit when enforced.
    pub consumed_seconds: u64,
    /// Seconds left before the limit; always 0 when not enforced.
    pub remaining_seconds: u64,
}

impl QuotaSnapshot {
    /// Builds a snapshot from a limit and a raw consumed counter.
    pub fn new(limit_seconds: u64, consumed_seconds: u64) -> Self {
        if limit_seconds > 0 {
            let consumed = consumed_seconds.min(limit_seconds);
            Self {
                enforced: true,
                limit_seconds,
                consumed_seconds: consumed,
                remaining_seconds: limit_seconds - consumed,
            }
        } else {
            Self {
                enforced: false,
                limit_seconds: 0,
                consumed_seconds,
                remaining_seconds: 0,
            }
        }
    }

    /// Whether playback must stop for this ledger.
    pub fn is_exhausted(&self) -> bool {
        self.enforced && self.remaining_seconds == 0
    }
}

/// A snapshot for one content context, tagged for client correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    /// Ledger figures for this context.
    #[serde(flatten)]
    pub snapshot: QuotaSnapshot,
    /// The context key (`post-N`, `lesson-N`, `course-N`).
    pub key: String,
    /// The post whose counter backs this snapshot, if any.
    pub post_id: Option<PostId>,
    /// Echoed lesson id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<PostId>,
    /// Echoed course id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    /// Echoed lesson title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_title: Option<String>,
    /// Echoed course title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
}

impl ContextSnapshot {
    /// Tags a snapshot with the identity of the context it describes.
    pub fn new(snapshot: QuotaSnapshot, context: &ContentContext) -> Self {
        Self {
            snapshot,
            key: context.context_key(),
            post_id: context.counter_post(),
            lesson_id: context.lesson_id,
            course_id: context.course_id,
            lesson_title: context.lesson_title.clone(),
            course_title: context.course_title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_reports_zero_remaining() {
        for consumed in [0, 1, 10_000] {
            let snap = QuotaSnapshot::new(0, consumed);
            assert!(!snap.enforced);
            assert_eq!(snap.remaining_seconds, 0);
            assert!(!snap.is_exhausted());
        }
    }

    #[test]
    fn test_enforced_clamps_consumed() {
        let snap = QuotaSnapshot::new(600, 900);
        assert!(snap.enforced);
        assert_eq!(snap.consumed_seconds, 600);
        assert_eq!(snap.remaining_seconds, 0);
        assert!(snap.is_exhausted());

        let partial = QuotaSnapshot::new(600, 120);
        assert_eq!(partial.consumed_seconds + partial.remaining_seconds, 600);
    }

    #[test]
    fn test_context_snapshot_serializes_flat() {
        let ctx = ContentContext::for_post(PostId(3));
        let snap = ContextSnapshot::new(QuotaSnapshot::new(60, 10), &ctx);
        let json = serde_json::to_value(&snap).expect("serialize");
        assert_eq!(json["key"], "post-3");
        assert_eq!(json["postId"], 3);
        assert_eq!(json["remainingSeconds"], 50);
        assert!(json.get("lessonId").is_none());
    }
}
