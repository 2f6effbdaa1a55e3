//! Stockroom storefront library.
//!
//! The HTTP application, its services and both store backends live here so
//! the binary, the operator CLI and the integration tests share them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use axum::http::Request;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::service::SignedCookie;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::db::Store;
use crate::middleware::{RequestId, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Directory served under `/static`, relative to the working directory.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront application.
///
/// Layers, outermost first: request ID, trace span, security headers,
/// session. Sentry layers are added by the binary on top of this.
pub fn app<S, SS>(state: AppState<S>, session_layer: SessionManagerLayer<SS, SignedCookie>) -> Router
where
    S: Store,
    SS: SessionStore + Clone,
{
    let rate_limit = state.config().auth_rate_limit;

    Router::new()
        .merge(routes::routes::<S>(rate_limit))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn request_span<B>(request: &Request<B>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or("", RequestId::as_str);
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
        user_id = tracing::field::Empty,
    )
}
