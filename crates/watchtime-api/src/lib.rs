//! # watchtime-api
//!
//! HTTP API layer for Watchtime built on Axum.
//!
//! Provides the viewer endpoints (status polling and usage reports), the
//! admin quota endpoints, health checks, middleware (CORS, request
//! logging, timeouts), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{Backends, build_app, build_state};
pub use error::ApiError;
pub use state::AppState;
