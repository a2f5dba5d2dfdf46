//! # watchtime-auth
//!
//! Identity for Watchtime: HMAC-signed JWT bearer tokens carrying the
//! viewer's user id and role. The API layer decodes them to answer
//! "who is calling"; the CLI mints them for operators and test clients.

pub mod jwt;
pub mod role;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use role::Role;
