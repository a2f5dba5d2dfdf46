//! Admin limit management handlers.

use axum::Json;
use axum::extract::{Path, State};

use watchtime_core::types::{PostId, UserId};
use watchtime_service::admin::{AdminUserStatus, ContentLimit, DefaultLimit};

use crate::dto::request::{ContentLimitRequest, DefaultLimitRequest, UserLimitRequest};
use crate::dto::response::ApiResponse;
use crate::dto::validate;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::extractors::path::parse_id;
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// PUT /api/admin/watch/default-limit
pub async fn set_default_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<DefaultLimitRequest>,
) -> Result<Json<ApiResponse<DefaultLimit>>, ApiError> {
    require_admin(&auth)?;
    let updated = state
        .admin_service
        .set_default_limit(&auth, req.minutes)
        .await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// PUT /api/admin/watch/users/{id}/limit
pub async fn set_user_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UserLimitRequest>,
) -> Result<Json<ApiResponse<AdminUserStatus>>, ApiError> {
    require_admin(&auth)?;
    validate(&req)?;
    let user = UserId(parse_id(&id)?);
    let seconds = req.seconds.and_then(|s| u64::try_from(s).ok());
    let status = state
        .admin_service
        .set_user_limit(&auth, user, seconds)
        .await?;
    Ok(Json(ApiResponse::ok(status)))
}

/// PUT /api/admin/content/{id}/limit
pub async fn set_content_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ContentLimitRequest>,
) -> Result<Json<ApiResponse<ContentLimit>>, ApiError> {
    require_admin(&auth)?;
    validate(&req)?;
    let post = PostId(parse_id(&id)?);
    let minutes = req.minutes.and_then(|m| u32::try_from(m).ok());
    let limit = state
        .admin_service
        .set_content_limit(&auth, post, minutes)
        .await?;
    Ok(Json(ApiResponse::ok(limit)))
}
