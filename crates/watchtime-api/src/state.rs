//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use watchtime_auth::JwtDecoder;
use watchtime_core::config::AppConfig;
use watchtime_core::traits::catalog::ContentCatalog;
use watchtime_core::traits::store::QuotaStore;
use watchtime_service::{AdminQuotaService, QuotaService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Quota store (Redis or in-memory)
    pub store: Arc<dyn QuotaStore>,
    /// Content catalog (PostgreSQL or in-memory)
    pub catalog: Arc<dyn ContentCatalog>,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Viewer quota service
    pub quota_service: Arc<QuotaService>,
    /// Admin quota service
    pub admin_service: Arc<AdminQuotaService>,
}
