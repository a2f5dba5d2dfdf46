//! # watchtime-service
//!
//! Quota accounting for Watchtime. Services follow constructor
//! injection: the quota store and catalog collaborators are handed in as
//! `Arc<dyn Trait>` references at construction time.
//!
//! - [`quota::LimitResolver`] picks the applicable limit for a user and context.
//! - [`quota::UsageAllocator`] applies batched playback reports under the
//!   per-context and global caps, serialized per user.
//! - [`quota::StatusBuilder`] produces read-only snapshots.
//! - [`admin::AdminQuotaService`] covers resets, reports, and limit management.

pub mod admin;
pub mod context;
pub mod quota;

pub use admin::AdminQuotaService;
pub use context::RequestContext;
pub use quota::{LimitResolver, QuotaService, StatusBuilder, UsageAllocator, UserLocks};
