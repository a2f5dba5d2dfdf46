//! Repository implementations of the catalog traits.

pub mod content;
pub mod settings;
pub mod user;

pub use content::ContentRepository;
pub use settings::SettingsRepository;
pub use user::UserRepository;

use watchtime_core::error::{AppError, ErrorKind};

/// Wraps a sqlx error with a short description of the failed operation.
pub(crate) fn db_err(what: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e)
}
