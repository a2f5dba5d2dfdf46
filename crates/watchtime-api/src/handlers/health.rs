//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<DetailedHealthResponse>>) {
    let store_ok = state.store.health_check().await.unwrap_or(false);
    let catalog_ok = state.catalog.health_check().await.unwrap_or(false);

    let label = |ok: bool| if ok { "connected" } else { "unavailable" }.to_string();
    let healthy = store_ok && catalog_ok;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(DetailedHealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            store: label(store_ok),
            catalog: label(catalog_ok),
        })),
    )
}
