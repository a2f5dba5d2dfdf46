//! Content, course, and enrollment repository.

use async_trait::async_trait;
use sqlx::PgPool;

use watchtime_core::AppError;
use watchtime_core::result::AppResult;
use watchtime_core::traits::catalog::ContentCatalog;
use watchtime_core::types::{Course, CourseId, PostId, UserId};

use super::db_err;

/// Reads `content`, `courses`, and `course_enrollments`.
#[derive(Debug, Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: i64,
    title: String,
}

impl ContentRepository {
    /// Create a new content repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentCatalog for ContentRepository {
    async fn limit_override_minutes(&self, post: PostId) -> AppResult<u32> {
        let minutes: Option<i32> =
            sqlx::query_scalar("SELECT watch_limit_minutes FROM content WHERE id = $1")
                .bind(post.as_i64())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err("read content limit"))?;
        Ok(minutes.and_then(|m| u32::try_from(m).ok()).unwrap_or(0))
    }

    async fn set_limit_override_minutes(
        &self,
        post: PostId,
        minutes: Option<u32>,
    ) -> AppResult<()> {
        let minutes = minutes.map(|m| i32::try_from(m).unwrap_or(i32::MAX)).unwrap_or(0);
        let result = sqlx::query(
            "UPDATE content SET watch_limit_minutes = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(post.as_i64())
        .bind(minutes)
        .execute(&self.pool)
        .await
        .map_err(db_err("update content limit"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Post {post} not found")));
        }
        Ok(())
    }

    async fn course_of(&self, post: PostId) -> AppResult<Option<CourseId>> {
        let course: Option<Option<i64>> =
            sqlx::query_scalar("SELECT course_id FROM content WHERE id = $1")
                .bind(post.as_i64())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err("read content course"))?;
        Ok(course.flatten().and_then(CourseId::from_i64))
    }

    async fn post_title(&self, post: PostId) -> AppResult<Option<String>> {
        sqlx::query_scalar("SELECT title FROM content WHERE id = $1")
            .bind(post.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("read content title"))
    }

    async fn course_title(&self, course: CourseId) -> AppResult<Option<String>> {
        sqlx::query_scalar("SELECT title FROM courses WHERE id = $1")
            .bind(course.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("read course title"))
    }

    async fn list_courses(&self) -> AppResult<Vec<Course>> {
        let rows = sqlx::query_as::<_, CourseRow>("SELECT id, title FROM courses ORDER BY title, id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list courses"))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                CourseId::from_i64(row.id).map(|id| Course {
                    id,
                    title: row.title,
                })
            })
            .collect())
    }

    async fn user_ids_in_course(&self, course: CourseId) -> AppResult<Vec<UserId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT user_id FROM course_enrollments WHERE course_id = $1 ORDER BY user_id",
        )
        .bind(course.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list course enrollments"))?;

        Ok(ids.into_iter().filter_map(UserId::from_i64).collect())
    }

    async fn health_check(&self) -> AppResult<bool> {
        crate::connection::ping(&self.pool).await
    }
}
