//! # watchtime-core
//!
//! Core crate for Watchtime. Contains configuration schemas, typed
//! identifiers, the content context and snapshot types, the collaborator
//! traits implemented by the store and database crates, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Watchtime crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
