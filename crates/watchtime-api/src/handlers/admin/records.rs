//! Admin watch records report.

use axum::Json;
use axum::extract::{Query, State};

use watchtime_core::types::{CourseId, UserId};
use watchtime_service::admin::WatchRecord;

use crate::dto::request::RecordsQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// GET /api/admin/watch/records
pub async fn list_records(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<ApiResponse<Vec<WatchRecord>>>, ApiError> {
    require_admin(&auth)?;
    let records = state
        .admin_service
        .records(
            &auth,
            params.user_id.and_then(UserId::new),
            params.course_id.and_then(CourseId::new),
        )
        .await?;
    Ok(Json(ApiResponse::ok(records)))
}
