//! Caller roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use watchtime_core::AppError;

/// Role carried in a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May call the admin surface.
    Admin,
    /// Regular viewer.
    #[default]
    Viewer,
}

impl Role {
    /// Whether this role may manage quotas.
    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            other => Err(AppError::validation(format!("Unknown role: '{other}'"))),
        }
    }
}
