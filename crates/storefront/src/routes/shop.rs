//! Catalog overview for customers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::Store;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CategoryWithProducts;
use crate::routes::PageContext;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryWithProducts>,
}

/// Display every category with its products. Admins land on the dashboard.
pub async fn index<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Response, AppError> {
    if user.is_admin {
        return Ok(Redirect::to("/admin").into_response());
    }

    let categories = CatalogService::new(state.store()).overview().await?;
    Ok(IndexTemplate {
        page: PageContext::load(&session, Some(&user)).await,
        categories,
    }
    .into_response())
}
