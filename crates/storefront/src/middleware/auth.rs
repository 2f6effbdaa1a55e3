//! Authentication extractors.
//!
//! The session holds only a [`CurrentUser`] id. Each extractor reloads the
//! user from the store, derives an [`AccessLevel`] and checks it against the
//! route's [`Requirement`]. A denial stores a notice in the session and
//! redirects: anonymous visitors go to `/login`, customers on admin routes
//! go to `/`.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use stockroom_core::{AccessDenied, AccessLevel, Requirement};

use crate::db::Store;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::flash::set_notice;
use crate::models::session::keys;
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub User);

/// Extractor that requires a signed-in administrator.
pub struct RequireAdmin(pub User);

/// Extractor that optionally gets the signed-in user.
pub struct OptionalAuth(pub Option<User>);

/// Why an auth extractor turned the request away.
pub enum AuthRejection {
    /// Access level too low; the notice is already stored.
    Denied(AccessDenied),
    /// Session or store failure.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Denied(AccessDenied::LoginRequired) => Redirect::to("/login").into_response(),
            Self::Denied(AccessDenied::AdminRequired) => Redirect::to("/").into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

impl From<AppError> for AuthRejection {
    fn from(err: AppError) -> Self {
        Self::Failed(err)
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, Requirement::Authenticated)
            .await
            .map(Self)
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, Requirement::Admin).await.map(Self)
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let session = session_from(parts)?;
        Ok(Self(load_user(&session, state).await?))
    }
}

async fn require<S: Store>(
    parts: &Parts,
    state: &AppState<S>,
    requirement: Requirement,
) -> Result<User, AuthRejection> {
    let session = session_from(parts)?;
    let user = load_user(&session, state).await?;
    let level = user.as_ref().map_or(AccessLevel::Anonymous, User::access_level);

    match (level.permits(requirement), user) {
        (Ok(()), Some(user)) => Ok(user),
        (Err(denied), _) => {
            tracing::debug!(path = %parts.uri.path(), %level, "Access denied");
            set_notice(&session, &denied.to_string())
                .await
                .map_err(AppError::from)?;
            Err(AuthRejection::Denied(denied))
        }
        (Ok(()), None) => Err(AuthRejection::Denied(AccessDenied::LoginRequired)),
    }
}

fn session_from(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session layer missing".to_string()))
}

/// Resolve the session's user against the store.
///
/// A session pointing at a user that no longer exists is cleared.
async fn load_user<S: Store>(
    session: &Session,
    state: &AppState<S>,
) -> Result<Option<User>, AppError> {
    let Some(current) = session.get::<CurrentUser>(keys::CURRENT_USER).await? else {
        return Ok(None);
    };

    let user = AuthService::new(state.store()).find_user(current.id).await?;
    match &user {
        Some(user) => {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
            set_sentry_user(&user.id, Some(user.username.as_str()));
        }
        None => {
            tracing::info!(user_id = %current.id, "Session user no longer exists");
            clear_current_user(session).await?;
        }
    }
    Ok(user)
}

/// Helper to set the current user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(
            keys::CURRENT_USER,
            CurrentUser {
                id: user.id,
                username: user.username.to_string(),
            },
        )
        .await
}

/// Helper to clear the current user from the session (logout).
///
/// Other session data, such as a pending notice, is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    clear_sentry_user();
    Ok(())
}
