//! Key builders for every quota store entry.
//!
//! Keys are relative; the Redis client prepends the configured prefix.

use watchtime_core::types::UserId;

/// Key holding a user's global consumed seconds.
pub fn global_consumed(user: UserId) -> String {
    format!("quota:global:{user}")
}

/// Hash key mapping post id to consumed seconds for one user.
pub fn context_consumed(user: UserId) -> String {
    format!("quota:posts:{user}")
}

/// Set of users that have any ledger entry.
pub fn tracked_users() -> String {
    "quota:users".to_string()
}
