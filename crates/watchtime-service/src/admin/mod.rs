//! Administrative quota operations: lookups, resets, reports, and limits.

pub mod records;
pub mod service;
pub mod views;

pub use service::AdminQuotaService;
pub use views::{
    AdminUserStatus, ContentLimit, CourseReset, DefaultLimit, UserSummary, WatchRecord, WatchUser,
};
