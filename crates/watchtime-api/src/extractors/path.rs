//! Typed path parameter helpers.

use watchtime_core::AppError;

/// Parses a positive numeric id from a path segment.
pub fn parse_id(s: &str) -> Result<u64, AppError> {
    s.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::validation(format!("Invalid id: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("abc").is_err());
    }
}
