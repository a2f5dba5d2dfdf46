//! Admin-only handlers.

pub mod courses;
pub mod limits;
pub mod records;
pub mod users;
