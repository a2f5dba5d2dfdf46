//! # watchtime-database
//!
//! PostgreSQL connection management and the repositories that implement
//! the catalog traits (`ContentCatalog`, `UserDirectory`, `SettingsStore`)
//! for the `postgres` catalog provider.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
