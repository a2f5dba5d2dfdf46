//! Store manager that dispatches to the configured quota backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use watchtime_core::config::StoreConfig;
use watchtime_core::error::AppError;
use watchtime_core::result::AppResult;
use watchtime_core::traits::store::{CommitOutcome, ContextUsage, QuotaStore, UsageCommit};
use watchtime_core::types::{PostId, UserId};

/// Quota store manager wrapping the configured backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner quota store.
    inner: Arc<dyn QuotaStore>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn QuotaStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis quota store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisQuotaStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory quota store");
                Arc::new(crate::memory::MemoryQuotaStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }
}

#[async_trait]
impl QuotaStore for StoreManager {
    async fn get(&self, user: UserId, post: PostId) -> AppResult<u64> {
        self.inner.get(user, post).await
    }

    async fn get_global(&self, user: UserId) -> AppResult<u64> {
        self.inner.get_global(user).await
    }

    async fn increment(&self, user: UserId, post: PostId, delta: u64) -> AppResult<u64> {
        self.inner.increment(user, post, delta).await
    }

    async fn increment_global(&self, user: UserId, delta: u64) -> AppResult<u64> {
        self.inner.increment_global(user, delta).await
    }

    async fn set_global(&self, user: UserId, seconds: u64) -> AppResult<()> {
        self.inner.set_global(user, seconds).await
    }

    async fn commit(&self, user: UserId, commit: &UsageCommit) -> AppResult<CommitOutcome> {
        self.inner.commit(user, commit).await
    }

    async fn usage_for_user(&self, user: UserId) -> AppResult<Vec<ContextUsage>> {
        self.inner.usage_for_user(user).await
    }

    async fn reset_user(&self, user: UserId, posts: Option<&[PostId]>) -> AppResult<u64> {
        self.inner.reset_user(user, posts).await
    }

    async fn tracked_users(&self) -> AppResult<Vec<UserId>> {
        self.inner.tracked_users().await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtime_core::error::ErrorKind;

    #[tokio::test]
    async fn test_unknown_provider_is_configuration_error() {
        let config = StoreConfig {
            provider: "etcd".to_string(),
            ..StoreConfig::default()
        };
        let err = StoreManager::new(&config).await.unwrap_err();
        assert!(err.is(ErrorKind::Configuration));
    }

    #[cfg(feature = "memory")]
    #[tokio::test]
    async fn test_memory_provider_delegates() {
        let manager = StoreManager::new(&StoreConfig::default()).await.unwrap();
        manager.increment(UserId(1), PostId(2), 40).await.unwrap();
        assert_eq!(manager.get(UserId(1), PostId(2)).await.unwrap(), 40);
        assert!(manager.health_check().await.unwrap());
    }
}
