//! Core traits defined in `watchtime-core` and implemented by other crates.

pub mod catalog;
pub mod store;

pub use catalog::{ContentCatalog, SettingsStore, UserDirectory};
pub use store::{CommitOutcome, ContextUsage, QuotaStore, UsageCommit};
