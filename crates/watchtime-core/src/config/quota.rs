//! Watch-time limit configuration.

use serde::{Deserialize, Serialize};

/// Default limit used when neither the settings store nor an override
/// supplies one.
pub const DEFAULT_LIMIT_MINUTES: u32 = 180;

/// Quota accounting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Process-wide default limit in minutes (0 = unlimited).
    #[serde(default = "default_limit_minutes")]
    pub default_limit_minutes: u32,
    /// How long a per-content override is cached by the resolver, in seconds.
    #[serde(default = "default_override_ttl")]
    pub override_cache_ttl_seconds: u64,
    /// Maximum number of cached per-content overrides.
    #[serde(default = "default_override_capacity")]
    pub override_cache_capacity: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_limit_minutes: default_limit_minutes(),
            override_cache_ttl_seconds: default_override_ttl(),
            override_cache_capacity: default_override_capacity(),
        }
    }
}

fn default_limit_minutes() -> u32 {
    DEFAULT_LIMIT_MINUTES
}

fn default_override_ttl() -> u64 {
    30
}

fn default_override_capacity() -> u64 {
    10_000
}
