//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

/// Session-stored user identity.
///
/// Only the id is trusted; the user row is reloaded on every request so that
/// admin rights and deletions apply immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Username at login time, for logs.
    pub username: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the one-shot notice shown on the next page.
    pub const NOTICE: &str = "notice";
}
