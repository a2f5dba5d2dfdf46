//! Bearer token extractors: `AuthUser` (required) and `MaybeAuthUser` (optional).

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use watchtime_core::AppError;
use watchtime_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::unauthenticated("Missing Authorization header"))?;
        Ok(AuthUser(authenticate(state, token)?))
    }
}

/// Caller identity when a valid bearer token is present.
///
/// A missing or unverifiable token yields `None` instead of rejecting
/// the request.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<RequestContext>);

impl MaybeAuthUser {
    /// Returns the inner `RequestContext`, if any.
    pub fn context(&self) -> Option<&RequestContext> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = match bearer_token(parts) {
            Ok(Some(token)) => match authenticate(state, token) {
                Ok(ctx) => Some(ctx),
                Err(e) => {
                    debug!(error = %e, "Ignoring unverifiable bearer token");
                    None
                }
            },
            _ => None,
        };
        Ok(MaybeAuthUser(ctx))
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| AppError::unauthenticated("Invalid Authorization header"))?;
    header
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| AppError::unauthenticated("Invalid Authorization header format"))
}

fn authenticate(state: &AppState, token: &str) -> Result<RequestContext, AppError> {
    let claims = state.jwt_decoder.decode(token)?;
    Ok(RequestContext::new(claims.user_id()?, claims.role))
}
