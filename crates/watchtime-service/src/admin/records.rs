//! Formatting helpers for the records report.

/// Minutes for display, rounding any started minute up.
pub fn ceil_minutes(seconds: u64) -> u64 {
    seconds.div_ceil(60)
}

/// `consumed/limit`, or `consumed/unlimited` when the limit is 0.
pub fn visualized(consumed_minutes: u64, limit_minutes: u64) -> String {
    if limit_minutes > 0 {
        format!("{consumed_minutes}/{limit_minutes}")
    } else {
        format!("{consumed_minutes}/unlimited")
    }
}
