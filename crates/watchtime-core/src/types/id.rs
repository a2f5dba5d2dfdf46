//! Newtype wrappers around `u64` for all domain identifiers.
//!
//! Identifiers come from the content platform and are always positive;
//! zero is never a valid id and is mapped to `None` at the boundary.
//! Using distinct types prevents accidentally passing a `CourseId` where
//! a `PostId` is expected.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `u64`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create an identifier, returning `None` for zero.
            pub fn new(value: u64) -> Option<Self> {
                (value > 0).then_some(Self(value))
            }

            /// Create an identifier from a signed database value.
            pub fn from_i64(value: i64) -> Option<Self> {
                u64::try_from(value).ok().and_then(Self::new)
            }

            /// Return the inner value.
            pub fn get(self) -> u64 {
                self.0
            }

            /// Return the value as a signed integer for database binding.
            pub fn as_i64(self) -> i64 {
                i64::try_from(self.0).unwrap_or(i64::MAX)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a viewer account.
    UserId
);

define_id!(
    /// Unique identifier for a content post (video page or lesson).
    PostId
);

define_id!(
    /// Unique identifier for a course grouping lessons.
    CourseId
);
