//! JWT token creation.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use watchtime_core::config::AuthConfig;
use watchtime_core::error::{AppError, ErrorKind};
use watchtime_core::types::UserId;

use super::claims::Claims;
use crate::role::Role;

/// Signs bearer tokens with the configured HMAC secret.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl_minutes: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_minutes: i64::try_from(config.jwt_ttl_minutes).unwrap_or(i64::MAX / 60),
        }
    }

    /// Issues a token for `user` with the configured lifetime.
    pub fn issue(&self, user: UserId, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::minutes(self.ttl_minutes);
        self.sign(&Claims {
            sub: user.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    /// Signs arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to sign token", e)
        })
    }
}
