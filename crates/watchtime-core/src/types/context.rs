//! Content context: the post/lesson/course a playback report refers to.

use serde::{Deserialize, Deserializer, Serialize};

use super::id::{CourseId, PostId};
use crate::error::AppError;
use crate::result::AppResult;

/// Identifies the content unit against which playback seconds are tracked.
///
/// Id fields deserialize leniently: numbers and numeric strings are
/// accepted, anything else (including zero and negative values) reads as
/// absent. A malformed context therefore degrades to an empty one instead
/// of failing the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentContext {
    /// The post hosting the player.
    #[serde(default, deserialize_with = "lenient_id")]
    pub post_id: Option<PostId>,
    /// The lesson the player belongs to, if any.
    #[serde(default, deserialize_with = "lenient_id")]
    pub lesson_id: Option<PostId>,
    /// The course the lesson belongs to, if any.
    #[serde(default, deserialize_with = "lenient_id")]
    pub course_id: Option<CourseId>,
    /// Display title of the lesson.
    #[serde(default, deserialize_with = "lenient_title")]
    pub lesson_title: Option<String>,
    /// Display title of the course.
    #[serde(default, deserialize_with = "lenient_title")]
    pub course_title: Option<String>,
}

impl ContentContext {
    /// Context naming a single post.
    pub fn for_post(post_id: PostId) -> Self {
        Self {
            post_id: Some(post_id),
            ..Self::default()
        }
    }

    /// Context naming a lesson inside a course.
    pub fn for_lesson(lesson_id: PostId, course_id: Option<CourseId>) -> Self {
        Self {
            lesson_id: Some(lesson_id),
            course_id,
            ..Self::default()
        }
    }

    /// Key used to correlate responses with the client's players.
    ///
    /// `post-{id}`, else `lesson-{id}`, else `course-{id}`, else empty.
    pub fn context_key(&self) -> String {
        if let Some(post) = self.post_id {
            format!("post-{post}")
        } else if let Some(lesson) = self.lesson_id {
            format!("lesson-{lesson}")
        } else if let Some(course) = self.course_id {
            format!("course-{course}")
        } else {
            String::new()
        }
    }

    /// The post whose per-context counter this context reads and writes.
    ///
    /// Course-only contexts have no counter.
    pub fn counter_post(&self) -> Option<PostId> {
        self.post_id.or(self.lesson_id)
    }

    /// Whether the context names nothing at all.
    pub fn is_empty(&self) -> bool {
        self.post_id.is_none() && self.lesson_id.is_none() && self.course_id.is_none()
    }

    /// Interprets a raw context payload.
    ///
    /// `null` is the empty context; any other non-object payload is an
    /// `InvalidContext` error.
    pub fn from_value(value: serde_json::Value) -> AppResult<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::default()),
            serde_json::Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| AppError::invalid_context(format!("Unreadable context: {e}"))),
            other => Err(AppError::invalid_context(format!(
                "Context must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn lenient_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<LenientId>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let raw = match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(raw.filter(|v| *v > 0).map(|v| T::from(LenientId(v))))
}

fn lenient_title<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    })
}

/// Positive id parsed by the lenient deserializer.
#[doc(hidden)]
pub struct LenientId(u64);

impl From<LenientId> for PostId {
    fn from(id: LenientId) -> Self {
        PostId(id.0)
    }
}

impl From<LenientId> for CourseId {
    fn from(id: LenientId) -> Self {
        CourseId(id.0)
    }
}
