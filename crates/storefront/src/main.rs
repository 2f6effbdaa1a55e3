//! Stockroom storefront binary.
//!
//! Serves the shop and the admin pages on one port.
//!
//! # Architecture
//!
//! - Axum web framework with plain HTML forms
//! - Askama templates for server-side rendering
//! - `PostgreSQL` for catalog, carts, orders and sessions
//!
//! Migrations are NOT run on startup unless `STOCKROOM_AUTO_MIGRATE=true`.
//! Run them explicitly via: `cargo run -p stockroom-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockroom_storefront::config::StorefrontConfig;
use stockroom_storefront::db::{self, PgStore};
use stockroom_storefront::middleware::create_session_layer;
use stockroom_storefront::services::auth::AuthService;
use stockroom_storefront::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry.sample_rate,
            traces_sample_rate: config.sentry.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stockroom_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let session_store = PostgresStore::new(pool.clone());

    if config.auto_migrate {
        db::migrate(&pool).await.expect("Failed to run migrations");
        session_store
            .migrate()
            .await
            .expect("Failed to migrate session store");
        tracing::info!("Migrations applied");
    }

    let store = PgStore::new(pool);

    match AuthService::new(&store).ensure_admin(&config.bootstrap).await {
        Ok(Some(admin)) => match admin.generated_password {
            Some(password) => {
                // Printed, not logged: warnings are forwarded to Sentry.
                #[allow(clippy::print_stderr)]
                {
                    eprintln!(
                        "Bootstrap admin '{}' password: {}",
                        admin.user.username,
                        password.expose_secret()
                    );
                }
                tracing::warn!(
                    username = %admin.user.username,
                    "Created bootstrap admin with a generated password; change it now"
                );
            }
            None => tracing::info!(username = %admin.user.username, "Created bootstrap admin"),
        },
        Ok(None) => {}
        Err(e) => tracing::error!(error = %e, "Failed to ensure an admin account exists"),
    }

    let session_layer = create_session_layer(session_store, &config);
    let addr = config.socket_addr();
    let state = AppState::new(config, store);

    let app = stockroom_storefront::app(state, session_layer)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
