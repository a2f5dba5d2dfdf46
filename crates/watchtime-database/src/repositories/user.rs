//! User directory repository.

use async_trait::async_trait;
use sqlx::PgPool;

use watchtime_core::AppError;
use watchtime_core::result::AppResult;
use watchtime_core::traits::catalog::UserDirectory;
use watchtime_core::types::{UserId, UserProfile};

use super::db_err;

const PROFILE_COLUMNS: &str = "id, login, email, display_name, first_name, last_name";

/// Reads viewer accounts and their limit overrides from `users`.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    login: String,
    email: String,
    display_name: String,
    first_name: String,
    last_name: String,
}

impl UserRow {
    fn into_profile(self) -> Option<UserProfile> {
        Some(UserProfile {
            id: UserId::from_i64(self.id)?,
            user_login: self.login,
            user_email: self.email,
            display_name: self.display_name,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, clause: &str, bind: BindValue<'_>) -> AppResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE {clause}");
        let query = sqlx::query_as::<_, UserRow>(&sql);
        let query = match bind {
            BindValue::Id(id) => query.bind(id),
            BindValue::Text(text) => query.bind(text),
        };
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("look up user"))?;
        Ok(row.and_then(UserRow::into_profile))
    }
}

enum BindValue<'a> {
    Id(i64),
    Text(&'a str),
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        self.find_one("id = $1", BindValue::Id(id.as_i64())).await
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<UserProfile>> {
        self.find_one("login = $1", BindValue::Text(login)).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        self.find_one("LOWER(email) = LOWER($1)", BindValue::Text(email))
            .await
    }

    async fn find_many(&self, ids: &[UserId]) -> AppResult<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY display_name, id"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list users"))?;
        Ok(rows.into_iter().filter_map(UserRow::into_profile).collect())
    }

    async fn limit_override_seconds(&self, user: UserId) -> AppResult<u64> {
        let seconds: Option<i64> =
            sqlx::query_scalar("SELECT watch_limit_seconds FROM users WHERE id = $1")
                .bind(user.as_i64())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err("read user limit"))?;
        Ok(seconds.and_then(|s| u64::try_from(s).ok()).unwrap_or(0))
    }

    async fn set_limit_override_seconds(
        &self,
        user: UserId,
        seconds: Option<u64>,
    ) -> AppResult<()> {
        let seconds = seconds
            .map(|s| i64::try_from(s).unwrap_or(i64::MAX))
            .unwrap_or(0);
        let result = sqlx::query(
            "UPDATE users SET watch_limit_seconds = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user.as_i64())
        .bind(seconds)
        .execute(&self.pool)
        .await
        .map_err(db_err("update user limit"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user} not found")));
        }
        Ok(())
    }

    async fn users_with_limit_override(&self) -> AppResult<Vec<UserId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM users WHERE watch_limit_seconds > 0 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list users with limits"))?;
        Ok(ids.into_iter().filter_map(UserId::from_i64).collect())
    }
}
