//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use watchtime_core::config::AuthConfig;
use watchtime_core::error::AppError;

use super::claims::Claims;

/// Validates bearer tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::unauthenticated("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::unauthenticated("Invalid token signature")
                }
                _ => AppError::unauthenticated("Invalid token"),
            }
        })?;

        // Reject tokens whose subject is not a usable id up front.
        data.claims.user_id()?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use crate::role::Role;
    use watchtime_core::error::ErrorKind;
    use watchtime_core::types::UserId;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_issue_then_decode() {
        let cfg = config("unit-test-secret");
        let token = JwtEncoder::new(&cfg).issue(UserId(12), Role::Admin).unwrap();
        let claims = JwtDecoder::new(&cfg).decode(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId(12));
        assert!(claims.role.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_unauthenticated() {
        let token = JwtEncoder::new(&config("a"))
            .issue(UserId(1), Role::Viewer)
            .unwrap();
        let err = JwtDecoder::new(&config("b")).decode(&token).unwrap_err();
        assert!(err.is(ErrorKind::Unauthenticated));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let cfg = config("unit-test-secret");
        let now = chrono::Utc::now().timestamp();
        let token = JwtEncoder::new(&cfg)
            .sign(&Claims {
                sub: "3".to_string(),
                role: Role::Viewer,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        let err = JwtDecoder::new(&cfg).decode(&token).unwrap_err();
        assert!(err.is(ErrorKind::Unauthenticated));
        assert_eq!(err.message, "Token has expired");
    }

    #[test]
    fn test_garbage_token() {
        let err = JwtDecoder::new(&config("s")).decode("not.a.jwt").unwrap_err();
        assert!(err.is(ErrorKind::Unauthenticated));
    }
}
