//! Account domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    User,
    Admin,
}

impl Default for AccountRole {
    fn default() -> Self {
        Self::User
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Account model
///
/// Serialized in camelCase to match the persisted record layout
/// (`id, email, firstName, lastName, password, role, createdAt, lastLogin`).
/// The password is stored verbatim as submitted; this is a documented
/// weakness of the demo, not a design goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    /// Normalized (trimmed, lowercased) before storage and comparison
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(default)]
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
    /// Absent until the first successful authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, AccountRole::Admin)
    }

    /// Full name as rendered by the UI
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Two-letter initials for avatar badges
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .next()
            .into_iter()
            .chain(self.last_name.chars().next())
            .flat_map(|c| c.to_uppercase())
            .collect()
    }
}

/// Normalize an email address for storage and uniqueness comparison
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ── Tests ──────────────────────────────────────────────────────
