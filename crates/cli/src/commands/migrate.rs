//! Database migration command.
//!
//! Applies the schema migrations in `crates/storefront/migrations/` and
//! creates the session table used by `tower-sessions-sqlx-store`.

use tower_sessions_sqlx_store::PostgresStore;

use stockroom_storefront::db;

use super::{CommandError, connect};

/// Run all migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running schema migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
