//! Profile handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::Response};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::Store;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAuth, set_current_user};
use crate::routes::{PageContext, redirect_with_notice};
use crate::services::auth::{AuthService, ProfileChange};
use crate::state::AppState;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    /// New password; blank keeps the current one.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub current_password: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub username: String,
    pub name: String,
}

/// Display the profile form.
pub async fn profile_page<S: Store>(
    RequireAuth(user): RequireAuth,
    session: Session,
) -> ProfileTemplate {
    ProfileTemplate {
        page: PageContext::load(&session, Some(&user)).await,
        username: user.username.to_string(),
        name: user.name,
    }
}

/// Handle profile form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let change = ProfileChange {
        username: &form.username,
        name: &form.name,
        current_password: &form.current_password,
        new_password: &form.password,
    };

    match AuthService::new(state.store())
        .update_profile(user.id, change)
        .await
    {
        Ok(updated) => {
            set_current_user(&session, &updated).await?;
            Ok(redirect_with_notice(&session, "/profile", "Profile updated successfully.").await)
        }
        Err(e) if e.is_rejection() => {
            Ok(redirect_with_notice(&session, "/profile", &e.to_string()).await)
        }
        Err(e) => Err(e.into()),
    }
}
