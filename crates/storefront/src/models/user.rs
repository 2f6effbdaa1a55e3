//! User domain types.

use chrono::{DateTime, Utc};

use stockroom_core::{AccessLevel, UserId, Username};

/// A registered user (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, unique.
    pub username: Username,
    /// Display name.
    pub name: String,
    /// Whether the user administers the catalog.
    pub is_admin: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Access level granted to this user.
    #[must_use]
    pub const fn access_level(&self) -> AccessLevel {
        AccessLevel::from_admin_flag(Some(self.is_admin))
    }
}

/// A user together with their stored password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// The user.
    pub user: User,
    /// PHC-format Argon2 hash.
    pub password_hash: String,
}

/// Fields for inserting a user.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    /// Login name.
    pub username: &'a Username,
    /// Display name.
    pub name: &'a str,
    /// PHC-format Argon2 hash.
    pub password_hash: &'a str,
    /// Admin flag.
    pub is_admin: bool,
}

/// Fields for updating a profile.
#[derive(Debug, Clone, Copy)]
pub struct ProfileUpdate<'a> {
    /// New login name.
    pub username: &'a Username,
    /// New display name.
    pub name: &'a str,
    /// New password hash; `None` keeps the current one.
    pub password_hash: Option<&'a str>,
}
