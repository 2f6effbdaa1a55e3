//! Persistence for Stockroom.
//!
//! # Tables (`stockroom` schema)
//!
//! - `users` - Accounts with Argon2 password hashes and the admin flag
//! - `categories` - Product categories
//! - `products` - Stocked products (`quantity >= 0`, `price > 0`)
//! - `cart_lines` - Pending purchases, unique per (user, product)
//! - `transactions` - One row per checkout with the accumulated total
//! - `order_lines` - Purchased products with their price snapshot
//!
//! Sessions live in `tower_sessions.session`, owned by the session store.
//!
//! # Units of work
//!
//! Every read and write goes through a [`UnitOfWork`] opened with
//! [`Store::begin`]. Writes become visible only after [`UnitOfWork::commit`];
//! dropping a unit of work discards them. Two backends implement the traits:
//! [`PgStore`] for production and [`MemoryStore`] for tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p stockroom-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stockroom_core::catalog::{ProductDraft, ProductEdit};
use stockroom_core::{CartLineId, CategoryId, ProductId, TransactionId, UserId, Username};

use crate::models::{
    CartEntry, CartLine, Category, NewOrderLine, NewUser, OrderEntry, OrderLine, Product,
    ProfileUpdate, Transaction, User, UserCredentials,
};

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// A transactional data store.
pub trait Store: Clone + Send + Sync + 'static {
    /// Unit of work type opened by [`Store::begin`].
    type UnitOfWork: UnitOfWork;

    /// Open a unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::UnitOfWork, RepositoryError>> + Send;

    /// Check that the store is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// One atomic batch of reads and writes.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] rolls back
/// every write made through it.
pub trait UnitOfWork: Send {
    // ---- users ----

    /// Get a user by ID.
    fn find_user(
        &mut self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user and their password hash by username.
    fn find_credentials(
        &mut self,
        username: &Username,
    ) -> impl Future<Output = Result<Option<UserCredentials>, RepositoryError>> + Send;

    /// Get a user and their password hash by ID.
    fn find_credentials_by_id(
        &mut self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<UserCredentials>, RepositoryError>> + Send;

    /// Insert a user. Fails with [`RepositoryError::Conflict`] on a taken username.
    fn insert_user(
        &mut self,
        user: NewUser<'_>,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Update username, name and optionally the password hash.
    fn update_profile(
        &mut self,
        id: UserId,
        update: ProfileUpdate<'_>,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Whether at least one admin account exists.
    fn admin_exists(&mut self) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    // ---- catalog ----

    /// Insert a category.
    fn insert_category(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    /// All categories ordered by name.
    fn list_categories(
        &mut self,
    ) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    /// Get a category by ID.
    fn find_category(
        &mut self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Insert a product.
    fn insert_product(
        &mut self,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    /// Apply an edit. Fails with [`RepositoryError::NotFound`] for an unknown product.
    fn update_product(
        &mut self,
        id: ProductId,
        edit: &ProductEdit,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    /// Get a product by ID.
    fn find_product(
        &mut self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Products ordered by name, optionally limited to one category.
    fn list_products(
        &mut self,
        category: Option<CategoryId>,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    // ---- cart ----

    /// Add to the (user, product) line, creating it when absent.
    fn upsert_cart_line(
        &mut self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> impl Future<Output = Result<CartLine, RepositoryError>> + Send;

    /// The user's cart lines joined with their products.
    fn cart_entries(
        &mut self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<CartEntry>, RepositoryError>> + Send;

    /// Same as [`UnitOfWork::cart_entries`], locking the lines and products
    /// until the unit of work ends.
    fn lock_cart_entries(
        &mut self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<CartEntry>, RepositoryError>> + Send;

    /// Delete one of the user's lines. Returns whether a line was removed.
    fn delete_cart_line(
        &mut self,
        user: UserId,
        line: CartLineId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    // ---- checkout ----

    /// Insert a transaction with a zero total.
    fn insert_transaction(
        &mut self,
        user: UserId,
    ) -> impl Future<Output = Result<Transaction, RepositoryError>> + Send;

    /// Subtract `quantity` from stock if at least that much is left.
    /// Returns whether the decrement happened.
    fn decrement_stock(
        &mut self,
        product: ProductId,
        quantity: i32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Insert an order line.
    fn insert_order_line(
        &mut self,
        order: NewOrderLine,
    ) -> impl Future<Output = Result<OrderLine, RepositoryError>> + Send;

    /// Add `amount` to a transaction's total.
    fn add_to_transaction_total(
        &mut self,
        id: TransactionId,
        amount: Decimal,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    // ---- history ----

    /// Get a transaction by ID.
    fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>, RepositoryError>> + Send;

    /// The user's transactions, newest first.
    fn transactions_for_user(
        &mut self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<Transaction>, RepositoryError>> + Send;

    /// Order lines for the given transactions with product names.
    fn order_entries(
        &mut self,
        transactions: &[TransactionId],
    ) -> impl Future<Output = Result<Vec<OrderEntry>, RepositoryError>> + Send;

    /// Make every write visible.
    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending schema migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
