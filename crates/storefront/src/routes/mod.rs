//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness
//! GET  /health/ready            - Readiness (store ping)
//!
//! # Auth
//! GET  /login, POST /login      - Login page / action
//! GET  /register, POST /register
//! POST /logout
//! GET  /profile, POST /profile  - Profile edit (requires auth)
//!
//! # Shop (requires auth)
//! GET  /                        - Catalog overview; admins go to /admin
//! POST /cart/{product_id}/add   - Add to cart
//! GET  /cart                    - Cart page
//! POST /cart/{line_id}/remove   - Remove a line
//! POST /cart/place_order        - Checkout
//! GET  /orders                  - Order history
//!
//! # Admin (requires admin)
//! GET  /admin                   - Dashboard
//! GET  /category/add, POST /category/add
//! GET  /category/{id}/show
//! GET  /product/add, POST /product/add     (?category_id= preselects)
//! GET  /product/{id}/edit, POST /product/{id}/edit
//! ```
//!
//! Handlers call one service and then either render a page or redirect with
//! a notice stored in the session.

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod shop;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::db::Store;
use crate::middleware::{auth_rate_limiter, set_notice, take_notice};
use crate::models::User;
use crate::state::AppState;

/// Signed-in user shown in the navigation bar.
#[derive(Debug, Clone)]
pub struct NavUser {
    pub username: String,
    pub is_admin: bool,
}

/// Data every page template needs: the nav user and the pending notice.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<NavUser>,
    pub notice: Option<String>,
}

impl PageContext {
    /// Build the context for a rendered page, consuming the pending notice.
    pub async fn load(session: &Session, user: Option<&User>) -> Self {
        Self {
            user: user.map(|user| NavUser {
                username: user.username.to_string(),
                is_admin: user.is_admin,
            }),
            notice: take_notice(session).await,
        }
    }
}

/// Store `notice` and redirect to `to`.
///
/// A session failure loses only the notice; the redirect still happens.
pub async fn redirect_with_notice(session: &Session, to: &str, notice: &str) -> Response {
    if let Err(e) = set_notice(session, notice).await {
        tracing::error!(error = %e, "Failed to store notice");
    }
    Redirect::to(to).into_response()
}

/// Create the login/register routes, rate limited when enabled.
fn credential_routes<S: Store>(rate_limit: bool) -> Router<AppState<S>> {
    let router = Router::new()
        .route("/login", get(auth::login_page::<S>).post(auth::login::<S>))
        .route(
            "/register",
            get(auth::register_page::<S>).post(auth::register::<S>),
        );
    if rate_limit {
        router.layer(auth_rate_limiter())
    } else {
        router
    }
}

/// Create the cart routes router.
fn cart_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(cart::show::<S>))
        .route("/{product_id}/add", post(cart::add::<S>))
        .route("/{line_id}/remove", post(cart::remove::<S>))
        .route("/place_order", post(cart::place_order::<S>))
}

/// Create the admin routes router.
fn admin_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/admin", get(admin::dashboard::<S>))
        .route(
            "/category/add",
            get(admin::add_category_page::<S>).post(admin::add_category::<S>),
        )
        .route("/category/{id}/show", get(admin::show_category::<S>))
        .route(
            "/product/add",
            get(admin::add_product_page::<S>).post(admin::add_product::<S>),
        )
        .route(
            "/product/{id}/edit",
            get(admin::edit_product_page::<S>).post(admin::edit_product::<S>),
        )
}

/// Create all routes for the storefront.
pub fn routes<S: Store>(rate_limit: bool) -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness::<S>))
        .merge(credential_routes::<S>(rate_limit))
        .route("/logout", post(auth::logout))
        .route(
            "/profile",
            get(account::profile_page::<S>).post(account::update_profile::<S>),
        )
        .route("/", get(shop::index::<S>))
        .nest("/cart", cart_routes::<S>())
        .route("/orders", get(orders::index::<S>))
        .merge(admin_routes::<S>())
}
