//! Application builder: wires backends, services, and the router into an Axum app.

use std::sync::Arc;

use axum::Router;
use tracing::info;

use watchtime_auth::JwtDecoder;
use watchtime_core::AppError;
use watchtime_core::config::AppConfig;
use watchtime_core::result::AppResult;
use watchtime_core::traits::catalog::{ContentCatalog, SettingsStore, UserDirectory};
use watchtime_core::traits::store::QuotaStore;
use watchtime_database::DatabasePool;
use watchtime_database::migration::run_migrations;
use watchtime_database::repositories::{ContentRepository, SettingsRepository, UserRepository};
use watchtime_service::{AdminQuotaService, LimitResolver, QuotaService, UserLocks};
use watchtime_store::StoreManager;
use watchtime_store::memory::MemoryCatalog;

use crate::router::build_router;
use crate::state::AppState;

/// The store and catalog collaborators the services run against.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Quota store.
    pub store: Arc<dyn QuotaStore>,
    /// Content catalog.
    pub catalog: Arc<dyn ContentCatalog>,
    /// User directory.
    pub users: Arc<dyn UserDirectory>,
    /// Settings store.
    pub settings: Arc<dyn SettingsStore>,
}

impl Backends {
    /// Opens the backends named by the configuration.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        info!(provider = %config.store.provider, "Initializing quota store");
        let store: Arc<dyn QuotaStore> = Arc::new(StoreManager::new(&config.store).await?);

        info!(provider = %config.catalog.provider, "Initializing catalog");
        match config.catalog.provider.as_str() {
            "memory" => Ok(Self::in_memory(store, MemoryCatalog::new())),
            "postgres" => {
                let db = DatabasePool::connect(&config.database).await?;
                run_migrations(db.pool()).await?;
                Ok(Self {
                    store,
                    catalog: Arc::new(ContentRepository::new(db.pool().clone())),
                    users: Arc::new(UserRepository::new(db.pool().clone())),
                    settings: Arc::new(SettingsRepository::new(db.pool().clone())),
                })
            }
            other => Err(AppError::configuration(format!(
                "Unknown catalog provider: '{other}'. Supported: memory, postgres"
            ))),
        }
    }

    /// Backends sharing one in-memory catalog for content, users, and settings.
    pub fn in_memory(store: Arc<dyn QuotaStore>, catalog: MemoryCatalog) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            store,
            catalog: catalog.clone(),
            users: catalog.clone(),
            settings: catalog,
        }
    }
}

/// Connects the configured backends and builds the application state.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
    let backends = Backends::connect(&config).await?;
    Ok(AppState::from_backends(config, backends))
}

impl AppState {
    /// Builds services over already-opened backends.
    pub fn from_backends(config: AppConfig, backends: Backends) -> Self {
        let resolver = Arc::new(LimitResolver::new(
            Arc::clone(&backends.catalog),
            Arc::clone(&backends.users),
            Arc::clone(&backends.settings),
            &config.quota,
        ));
        let locks = UserLocks::new();

        let quota_service = Arc::new(QuotaService::new(
            Arc::clone(&backends.store),
            Arc::clone(&resolver),
            locks.clone(),
        ));
        let admin_service = Arc::new(AdminQuotaService::new(
            Arc::clone(&backends.store),
            Arc::clone(&backends.catalog),
            Arc::clone(&backends.users),
            Arc::clone(&backends.settings),
            resolver,
            locks,
        ));
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

        Self {
            config: Arc::new(config),
            store: backends.store,
            catalog: backends.catalog,
            jwt_decoder,
            quota_service,
            admin_service,
        }
    }
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}
