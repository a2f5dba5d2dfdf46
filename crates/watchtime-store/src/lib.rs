//! # watchtime-store
//!
//! Quota store implementations for Watchtime. Supports two modes:
//!
//! - **memory**: In-process ledgers using [dashmap](https://crates.io/crates/dashmap)
//! - **redis**: Redis-backed ledgers using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. The memory
//! module also provides [`memory::MemoryCatalog`], a single-node catalog
//! used when no database is configured and throughout the test suites.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::StoreManager;
