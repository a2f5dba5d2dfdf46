//! Core type definitions used across the Watchtime workspace.

pub mod context;
pub mod id;
pub mod profile;
pub mod snapshot;

pub use context::ContentContext;
pub use id::{CourseId, PostId, UserId};
pub use profile::{Course, UserProfile};
pub use snapshot::{ContextSnapshot, QuotaSnapshot};
