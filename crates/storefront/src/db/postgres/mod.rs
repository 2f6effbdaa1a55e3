//! `PostgreSQL` store backed by an sqlx connection pool.
//!
//! Each [`PgUnitOfWork`] wraps one database transaction. Dropping it without
//! committing rolls the transaction back.

mod cart;
mod catalog;
mod orders;
mod users;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};

use stockroom_core::catalog::{ProductDraft, ProductEdit};
use stockroom_core::{CartLineId, CategoryId, ProductId, TransactionId, UserId, Username};

use super::{RepositoryError, Store, UnitOfWork};
use crate::models::{
    CartEntry, CartLine, Category, NewOrderLine, NewUser, OrderEntry, OrderLine, Product,
    ProfileUpdate, Transaction, User, UserCredentials,
};

/// Store over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    type UnitOfWork = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork { tx })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One `PostgreSQL` transaction.
pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl UnitOfWork for PgUnitOfWork {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        users::find_by_id(&mut self.tx, id).await
    }

    async fn find_credentials(
        &mut self,
        username: &Username,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        users::find_credentials(&mut self.tx, username).await
    }

    async fn find_credentials_by_id(
        &mut self,
        id: UserId,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        users::find_credentials_by_id(&mut self.tx, id).await
    }

    async fn insert_user(&mut self, user: NewUser<'_>) -> Result<User, RepositoryError> {
        users::insert(&mut self.tx, user).await
    }

    async fn update_profile(
        &mut self,
        id: UserId,
        update: ProfileUpdate<'_>,
    ) -> Result<User, RepositoryError> {
        users::update_profile(&mut self.tx, id, update).await
    }

    async fn admin_exists(&mut self) -> Result<bool, RepositoryError> {
        users::admin_exists(&mut self.tx).await
    }

    async fn insert_category(&mut self, name: &str) -> Result<Category, RepositoryError> {
        catalog::insert_category(&mut self.tx, name).await
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, RepositoryError> {
        catalog::list_categories(&mut self.tx).await
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        catalog::find_category(&mut self.tx, id).await
    }

    async fn insert_product(&mut self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        catalog::insert_product(&mut self.tx, draft).await
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        edit: &ProductEdit,
    ) -> Result<Product, RepositoryError> {
        catalog::update_product(&mut self.tx, id, edit).await
    }

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        catalog::find_product(&mut self.tx, id).await
    }

    async fn list_products(
        &mut self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        catalog::list_products(&mut self.tx, category).await
    }

    async fn upsert_cart_line(
        &mut self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        cart::upsert_line(&mut self.tx, user, product, quantity).await
    }

    async fn cart_entries(&mut self, user: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        cart::cart_entries(&mut self.tx, user).await
    }

    async fn lock_cart_entries(&mut self, user: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        cart::lock_cart_entries(&mut self.tx, user).await
    }

    async fn delete_cart_line(
        &mut self,
        user: UserId,
        line: CartLineId,
    ) -> Result<bool, RepositoryError> {
        cart::delete_line(&mut self.tx, user, line).await
    }

    async fn insert_transaction(&mut self, user: UserId) -> Result<Transaction, RepositoryError> {
        orders::insert_transaction(&mut self.tx, user).await
    }

    async fn decrement_stock(
        &mut self,
        product: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        catalog::decrement_stock(&mut self.tx, product, quantity).await
    }

    async fn insert_order_line(&mut self, order: NewOrderLine) -> Result<OrderLine, RepositoryError> {
        orders::insert_order_line(&mut self.tx, order).await
    }

    async fn add_to_transaction_total(
        &mut self,
        id: TransactionId,
        amount: Decimal,
    ) -> Result<(), RepositoryError> {
        orders::add_to_total(&mut self.tx, id, amount).await
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, RepositoryError> {
        orders::find_transaction(&mut self.tx, id).await
    }

    async fn transactions_for_user(
        &mut self,
        user: UserId,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        orders::for_user(&mut self.tx, user).await
    }

    async fn order_entries(
        &mut self,
        transactions: &[TransactionId],
    ) -> Result<Vec<OrderEntry>, RepositoryError> {
        orders::order_entries(&mut self.tx, transactions).await
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
