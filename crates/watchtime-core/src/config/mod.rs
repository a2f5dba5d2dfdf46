//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod quota;
pub mod store;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::quota::QuotaConfig;
pub use self::store::{CatalogConfig, RedisStoreConfig, StoreConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings (catalog provider `postgres`).
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Quota store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Content/user catalog settings.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Watch-time limit settings.
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment name.
    ///
    /// Merges `config/default` with `config/{env}` and environment variables
    /// prefixed with `WATCHTIME__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::build(&[
            "config/default".to_string(),
            format!("config/{env}"),
        ])
    }

    /// Load configuration from an explicit file (plus the environment overlay).
    pub fn load_from(path: &str) -> Result<Self, AppError> {
        Self::build(&[path.to_string()])
    }

    fn build(files: &[String]) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        for file in files {
            builder = builder.add_source(config::File::with_name(file).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("WATCHTIME")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let config = AppConfig::load_from("config/does-not-exist").expect("defaults load");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.provider, "memory");
        assert_eq!(config.catalog.provider, "memory");
        assert_eq!(config.quota.default_limit_minutes, 180);
        assert_eq!(config.logging.level, "info");
    }
}
