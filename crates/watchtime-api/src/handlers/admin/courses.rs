//! Admin course handlers.

use axum::Json;
use axum::extract::{Path, State};

use watchtime_core::types::Course;
use watchtime_service::admin::{CourseReset, UserSummary};

use crate::dto::request::CourseResetRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::extractors::path::parse_id;
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// GET /api/admin/watch/courses
pub async fn list_courses(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Course>>>, ApiError> {
    require_admin(&auth)?;
    let courses = state.admin_service.list_courses(&auth).await?;
    Ok(Json(ApiResponse::ok(courses)))
}

/// GET /api/admin/watch/courses/{id}/users
pub async fn course_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    require_admin(&auth)?;
    let users = state
        .admin_service
        .course_users(&auth, parse_id(&id)?)
        .await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// POST /api/admin/watch/courses/{id}/reset
pub async fn reset_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<CourseResetRequest>>,
) -> Result<Json<ApiResponse<CourseReset>>, ApiError> {
    require_admin(&auth)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let result = state
        .admin_service
        .reset_course(&auth, parse_id(&id)?, &req.user_ids)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}
