//! Quota accounting: limit resolution, allocation, and status.

pub mod allocator;
pub mod locks;
pub mod resolver;
pub mod service;
pub mod status;

pub use allocator::{UsageAllocator, UsageEntry, UsageOutcome, UsageReport};
pub use locks::UserLocks;
pub use resolver::LimitResolver;
pub use service::QuotaService;
pub use status::{StatusBuilder, StatusView};
