//! Login, registration and logout handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::Store;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::routes::{PageContext, redirect_with_notice};
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page<S: Store>(
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> impl IntoResponse {
    LoginTemplate {
        page: PageContext::load(&session, user.as_ref()).await,
    }
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.store())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            set_current_user(&session, &user).await?;
            add_breadcrumb("auth", "Logged in", None);
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_rejection() => {
            tracing::info!(reason = %e, "Login rejected");
            Ok(redirect_with_notice(&session, "/login", &e.to_string()).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Display the registration page.
pub async fn register_page<S: Store>(
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> impl IntoResponse {
    RegisterTemplate {
        page: PageContext::load(&session, user.as_ref()).await,
    }
}

/// Handle registration form submission.
///
/// A new account is not signed in; the user is sent to the login page.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.store())
        .register(&form.username, &form.password, &form.name)
        .await
    {
        Ok(_) => Ok(redirect_with_notice(&session, "/login", "Successfully registered.").await),
        Err(e) if e.is_rejection() => {
            Ok(redirect_with_notice(&session, "/register", &e.to_string()).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle logout.
///
/// Only the user identity leaves the session.
pub async fn logout(session: Session) -> Result<Response, AppError> {
    clear_current_user(&session).await?;
    Ok(Redirect::to("/login").into_response())
}
