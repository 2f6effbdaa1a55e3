//! Access levels for request authorization.
//!
//! Every request resolves to exactly one [`AccessLevel`]. Routes declare a
//! [`Requirement`] and [`AccessLevel::permits`] decides whether the request
//! may proceed or which [`AccessDenied`] outcome applies.

use serde::{Deserialize, Serialize};

/// Who is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// No user in the session.
    #[default]
    Anonymous,
    /// A signed-in user without admin rights.
    Customer,
    /// A signed-in administrator.
    Admin,
}

/// What a route needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Any signed-in user.
    Authenticated,
    /// A signed-in administrator.
    Admin,
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AccessDenied {
    /// The route needs a signed-in user.
    #[error("You need to login first.")]
    LoginRequired,
    /// The route needs an administrator.
    #[error("You are not authorized to view this page.")]
    AdminRequired,
}

impl AccessLevel {
    /// Access level for an optional user's admin flag.
    #[must_use]
    pub const fn from_admin_flag(is_admin: Option<bool>) -> Self {
        match is_admin {
            None => Self::Anonymous,
            Some(false) => Self::Customer,
            Some(true) => Self::Admin,
        }
    }

    /// Check this level against a route requirement.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied::LoginRequired`] for anonymous requests and
    /// [`AccessDenied::AdminRequired`] for customers on admin routes.
    pub const fn permits(self, requirement: Requirement) -> Result<(), AccessDenied> {
        match (self, requirement) {
            (Self::Anonymous, _) => Err(AccessDenied::LoginRequired),
            (Self::Customer, Requirement::Admin) => Err(AccessDenied::AdminRequired),
            (Self::Customer, Requirement::Authenticated) | (Self::Admin, _) => Ok(()),
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_sent_to_login() {
        let level = AccessLevel::from_admin_flag(None);
        assert_eq!(
            level.permits(Requirement::Authenticated),
            Err(AccessDenied::LoginRequired)
        );
        assert_eq!(
            level.permits(Requirement::Admin),
            Err(AccessDenied::LoginRequired)
        );
    }

    #[test]
    fn customer_cannot_reach_admin_routes() {
        let level = AccessLevel::from_admin_flag(Some(false));
        assert_eq!(level, AccessLevel::Customer);
        assert_eq!(level.permits(Requirement::Authenticated), Ok(()));
        assert_eq!(
            level.permits(Requirement::Admin),
            Err(AccessDenied::AdminRequired)
        );
    }

    #[test]
    fn admin_passes_every_requirement() {
        let level = AccessLevel::from_admin_flag(Some(true));
        assert_eq!(level.permits(Requirement::Authenticated), Ok(()));
        assert_eq!(level.permits(Requirement::Admin), Ok(()));
    }

    #[test]
    fn denial_messages_are_user_facing() {
        assert_eq!(
            AccessDenied::LoginRequired.to_string(),
            "You need to login first."
        );
        assert_eq!(
            AccessDenied::AdminRequired.to_string(),
            "You are not authorized to view this page."
        );
    }
}
