//! Viewer handlers: status polling and usage reports.

use axum::Json;
use axum::extract::{Query, State};

use watchtime_core::types::ContentContext;
use watchtime_service::quota::{StatusView, UsageOutcome};

use crate::dto::request::UsageRequest;
use crate::dto::response::ApiResponse;
use crate::dto::validate;
use crate::error::ApiError;
use crate::extractors::{AuthUser, MaybeAuthUser};
use crate::state::AppState;

/// GET /api/watch/status
pub async fn status(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Query(context): Query<ContentContext>,
) -> Result<Json<ApiResponse<StatusView>>, ApiError> {
    let view = state
        .quota_service
        .status(caller.context(), &context)
        .await?;
    Ok(Json(ApiResponse::ok(view)))
}

/// POST /api/watch/usage
pub async fn apply_usage(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UsageRequest>,
) -> Result<Json<ApiResponse<UsageOutcome>>, ApiError> {
    validate(&req)?;
    let outcome = state
        .quota_service
        .apply_usage(Some(auth.context()), &req.into_report())
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}
