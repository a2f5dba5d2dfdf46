//! Convenience result type alias for Watchtime.

use crate::error::AppError;

/// A specialized `Result` type for Watchtime operations.
pub type AppResult<T> = Result<T, AppError>;
