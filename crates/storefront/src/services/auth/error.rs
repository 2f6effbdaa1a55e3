//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// Variants for which [`AuthError::is_rejection`] is true carry a message
/// meant for the user; the rest are server faults.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required form field was blank.
    #[error("{0}")]
    MissingFields(&'static str),

    /// Invalid username format.
    #[error("Invalid username: {0}.")]
    InvalidUsername(#[from] stockroom_core::UsernameError),

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid username or password.")]
    InvalidCredentials,

    /// User not found.
    #[error("User not found.")]
    UserNotFound,

    /// Username already taken at registration.
    #[error("Username already exists.")]
    UserAlreadyExists,

    /// Username taken by another account at profile update.
    #[error("User with this username already exists.")]
    UsernameTaken,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Current password did not verify during a profile update.
    #[error("Incorrect password.")]
    IncorrectPassword,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether this is a rejected request rather than a server fault.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Repository(_) | Self::PasswordHash)
    }
}
