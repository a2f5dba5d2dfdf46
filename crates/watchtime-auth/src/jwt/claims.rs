//! JWT claims carried by viewer and admin tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use watchtime_core::AppError;
use watchtime_core::types::UserId;

use crate::role::Role;

/// Claims payload of every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as a decimal string.
    pub sub: String,
    /// Caller role.
    #[serde(default)]
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// The user id from the subject claim.
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.sub
            .parse::<u64>()
            .ok()
            .and_then(UserId::new)
            .ok_or_else(|| AppError::unauthenticated("Token subject is not a user id"))
    }

    /// Expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}
