//! In-memory quota store and catalog.

pub mod catalog;
pub mod store;

pub use catalog::MemoryCatalog;
pub use store::MemoryQuotaStore;
