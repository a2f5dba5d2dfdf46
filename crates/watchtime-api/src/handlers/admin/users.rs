//! Admin user lookup and reset handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use watchtime_core::types::CourseId;
use watchtime_service::admin::{AdminUserStatus, WatchUser};

use crate::dto::request::WatchUsersQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// GET /api/admin/watch/users
pub async fn list_watch_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<WatchUsersQuery>,
) -> Result<Json<ApiResponse<Vec<WatchUser>>>, ApiError> {
    require_admin(&auth)?;
    let course = params.course_id.and_then(CourseId::new);
    let users = state
        .admin_service
        .watch_users(&auth, course, params.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// GET /api/admin/watch/users/{identifier}
pub async fn get_user_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<AdminUserStatus>>, ApiError> {
    require_admin(&auth)?;
    let status = state.admin_service.user_status(&auth, &identifier).await?;
    Ok(Json(ApiResponse::ok(status)))
}

/// POST /api/admin/watch/users/{identifier}/reset
pub async fn reset_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<AdminUserStatus>>, ApiError> {
    require_admin(&auth)?;
    let status = state.admin_service.reset_user(&auth, &identifier).await?;
    Ok(Json(ApiResponse::ok(status)))
}
