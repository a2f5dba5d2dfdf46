//! Catalog records: users and courses as seen by the admin surface.

use serde::{Deserialize, Serialize};

use super::id::{CourseId, UserId};

/// Viewer account details owned by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Account id.
    pub id: UserId,
    /// Login name.
    pub user_login: String,
    /// Email address.
    pub user_email: String,
    /// Public display name.
    pub display_name: String,
    /// Given name, possibly empty.
    #[serde(default)]
    pub first_name: String,
    /// Family name, possibly empty.
    #[serde(default)]
    pub last_name: String,
}

impl UserProfile {
    /// "First Last", falling back to the display name and then the login.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        if !self.display_name.trim().is_empty() {
            return self.display_name.clone();
        }
        self.user_login.clone()
    }

    /// Case-insensitive match against login, email, and display name.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.user_login, &self.user_email, &self.display_name]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A course grouping lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course id.
    pub id: CourseId,
    /// Course title.
    pub title: String,
}
