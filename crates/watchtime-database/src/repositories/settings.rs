//! Key/value settings repository.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use watchtime_core::result::AppResult;
use watchtime_core::traits::catalog::SettingsStore;

use super::db_err;

const DEFAULT_LIMIT_KEY: &str = "watch_limit_default_minutes";

/// Reads and writes the `settings` table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn default_limit_minutes(&self) -> AppResult<Option<i64>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(DEFAULT_LIMIT_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("read default limit"))?;

        Ok(raw.and_then(|value| match value.trim().parse::<i64>() {
            Ok(minutes) => Some(minutes),
            Err(_) => {
                warn!(value = %value, "Ignoring non-numeric default limit setting");
                None
            }
        }))
    }

    async fn set_default_limit_minutes(&self, minutes: u32) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(DEFAULT_LIMIT_KEY)
        .bind(minutes.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err("store default limit"))?;
        Ok(())
    }
}
