//! Integration test helpers for Stockroom.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory store and HTTP flows
//! cargo test -p stockroom-integration-tests
//!
//! # Include the PostgreSQL store tests
//! STOCKROOM_TEST_DATABASE_URL=postgres://... \
//!     cargo test -p stockroom-integration-tests -- --include-ignored
//! ```
//!
//! [`TestApp`] drives the full router through `tower::ServiceExt::oneshot`
//! with an in-memory session store, replaying the session cookie between
//! requests like a browser would.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::NaiveDate;
use secrecy::SecretString;
use tower::ServiceExt;

use stockroom_core::catalog::ProductDraft;
use stockroom_core::{CategoryId, Price};
use stockroom_storefront::config::{BootstrapConfig, SentryConfig, StorefrontConfig};
use stockroom_storefront::db::MemoryStore;
use stockroom_storefront::middleware::create_session_layer;
use stockroom_storefront::models::{Category, Product, User};
use stockroom_storefront::services::auth::AuthService;
use stockroom_storefront::services::catalog::CatalogService;
use stockroom_storefront::state::AppState;

/// Password used for every test account.
pub const PASSWORD: &str = "correct-horse-battery";

/// Configuration suitable for tests: plain HTTP, no rate limiting, no Sentry.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost".to_string(),
        session_secret: SecretString::from("kV9#qL2@xW7!mZ4$tR8%nB3^cF6&hJ1*"),
        bootstrap: BootstrapConfig::default(),
        auto_migrate: false,
        auth_rate_limit: false,
        sentry: SentryConfig::default(),
    }
}

/// Register a customer.
pub async fn customer(store: &MemoryStore, username: &str) -> User {
    AuthService::new(store)
        .register(username, PASSWORD, "")
        .await
        .unwrap()
}

/// Create an admin.
pub async fn admin(store: &MemoryStore, username: &str) -> User {
    AuthService::new(store)
        .create_admin(username, "", PASSWORD)
        .await
        .unwrap()
}

/// Create a category.
pub async fn category(store: &MemoryStore, name: &str) -> Category {
    CatalogService::new(store)
        .create_category(name)
        .await
        .unwrap()
}

/// Create a product priced in cents.
pub async fn product(
    store: &MemoryStore,
    category: CategoryId,
    name: &str,
    stock: i32,
    cents: i64,
) -> Product {
    let draft = ProductDraft::new(
        name,
        stock,
        Price::from_cents(cents).unwrap(),
        category,
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    )
    .unwrap();
    CatalogService::new(store).add_product(&draft).await.unwrap()
}

/// A response with its body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// The storefront router over a [`MemoryStore`] plus a cookie jar of one.
pub struct TestApp {
    pub store: MemoryStore,
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    /// Build the app over a fresh store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Build the app over an existing store.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        let config = test_config();
        let session_layer = create_session_layer(tower_sessions::MemoryStore::default(), &config);
        let router = stockroom_storefront::app(AppState::new(config, store.clone()), session_layer);
        Self {
            store,
            router,
            cookie: None,
        }
    }

    /// Send a GET request.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Send a urlencoded POST request.
    pub async fn post(&mut self, path: &str, form: &str) -> TestResponse {
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Log in through the form and assert it worked.
    pub async fn login(&mut self, username: &str) {
        let response = self
            .post("/login", &format!("username={username}&password={PASSWORD}"))
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/"));
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
