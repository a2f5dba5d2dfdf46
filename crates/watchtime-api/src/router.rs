//! Route definitions for the Watchtime HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState`
//! and passes it to every handler via Axum's `State` extractor.

use std::time::Duration;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .merge(watch_routes())
        .merge(admin_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Viewer endpoints: status polling and usage reports
fn watch_routes() -> Router<AppState> {
    Router::new()
        .route("/watch/status", get(handlers::watch::status))
        .route("/watch/usage", post(handlers::watch::apply_usage))
}

/// Admin endpoints: lookups, resets, reports, and limits
fn admin_routes() -> Router<AppState> {
    use handlers::admin::{courses, limits, records, users};

    Router::new()
        .route("/admin/watch/users", get(users::list_watch_users))
        .route("/admin/watch/users/{identifier}", get(users::get_user_status))
        .route("/admin/watch/users/{identifier}/reset", post(users::reset_user))
        .route("/admin/watch/users/{identifier}/limit", put(limits::set_user_limit))
        .route("/admin/watch/records", get(records::list_records))
        .route("/admin/watch/courses", get(courses::list_courses))
        .route("/admin/watch/courses/{id}/users", get(courses::course_users))
        .route("/admin/watch/courses/{id}/reset", post(courses::reset_course))
        .route("/admin/watch/default-limit", put(limits::set_default_limit))
        .route("/admin/content/{id}/limit", put(limits::set_content_limit))
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
