//! In-memory store for tests and local experiments.
//!
//! A unit of work holds the store's mutex for its whole lifetime and stages
//! writes on a copy of the tables, so units of work are serialized and a
//! dropped unit of work leaves no trace. [`MemoryStore::fail_once`] injects a
//! failure at a chosen step to exercise rollback paths.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockroom_core::catalog::{ProductDraft, ProductEdit};
use stockroom_core::{
    CartLineId, CategoryId, OrderLineId, ProductId, TransactionId, UserId, Username,
};

use super::{RepositoryError, Store, UnitOfWork};
use crate::models::{
    CartEntry, CartLine, Category, NewOrderLine, NewUser, OrderEntry, OrderLine, Product,
    ProfileUpdate, Transaction, User, UserCredentials,
};

/// A step at which [`MemoryStore::fail_once`] can inject an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// [`UnitOfWork::decrement_stock`]
    DecrementStock,
    /// [`UnitOfWork::insert_order_line`]
    InsertOrderLine,
    /// [`UnitOfWork::delete_cart_line`]
    DeleteCartLine,
    /// [`UnitOfWork::commit`]
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    user: i32,
    category: i32,
    product: i32,
    cart_line: i32,
    transaction: i32,
    order_line: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<UserCredentials>,
    categories: Vec<Category>,
    products: Vec<Product>,
    cart_lines: Vec<CartLine>,
    transactions: Vec<Transaction>,
    order_lines: Vec<OrderLine>,
    sequences: Sequences,
}

impl Tables {
    fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn username_taken(&self, username: &Username, except: Option<UserId>) -> bool {
        self.users
            .iter()
            .any(|c| &c.user.username == username && Some(c.user.id) != except)
    }

    fn cart_entries(&self, user: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        self.cart_lines
            .iter()
            .filter(|line| line.user_id == user)
            .map(|line| {
                let product = self.product(line.product_id).cloned().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "cart line {} references missing product {}",
                        line.id, line.product_id
                    ))
                })?;
                Ok(CartEntry {
                    line: line.clone(),
                    product,
                })
            })
            .collect()
    }
}

/// In-memory [`Store`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    failpoints: Arc<Mutex<Vec<FailPoint>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call at `point` fail with a database error.
    pub async fn fail_once(&self, point: FailPoint) {
        self.failpoints.lock().await.push(point);
    }
}

impl Store for MemoryStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryUnitOfWork {
            guard,
            staged,
            failpoints: Arc::clone(&self.failpoints),
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Staged writes over the locked tables.
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    failpoints: Arc<Mutex<Vec<FailPoint>>>,
}

impl MemoryUnitOfWork {
    async fn trip(&self, point: FailPoint) -> Result<(), RepositoryError> {
        let mut failpoints = self.failpoints.lock().await;
        if let Some(index) = failpoints.iter().position(|p| *p == point) {
            failpoints.remove(index);
            return Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
                "injected failure at {point:?}"
            ))));
        }
        Ok(())
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .staged
            .users
            .iter()
            .find(|c| c.user.id == id)
            .map(|c| c.user.clone()))
    }

    async fn find_credentials(
        &mut self,
        username: &Username,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        Ok(self
            .staged
            .users
            .iter()
            .find(|c| &c.user.username == username)
            .cloned())
    }

    async fn find_credentials_by_id(
        &mut self,
        id: UserId,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        Ok(self.staged.users.iter().find(|c| c.user.id == id).cloned())
    }

    async fn insert_user(&mut self, user: NewUser<'_>) -> Result<User, RepositoryError> {
        if self.staged.username_taken(user.username, None) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let created = User {
            id: UserId::new(next(&mut self.staged.sequences.user)),
            username: user.username.clone(),
            name: user.name.to_owned(),
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        self.staged.users.push(UserCredentials {
            user: created.clone(),
            password_hash: user.password_hash.to_owned(),
        });
        Ok(created)
    }

    async fn update_profile(
        &mut self,
        id: UserId,
        update: ProfileUpdate<'_>,
    ) -> Result<User, RepositoryError> {
        if self.staged.username_taken(update.username, Some(id)) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let record = self
            .staged
            .users
            .iter_mut()
            .find(|c| c.user.id == id)
            .ok_or(RepositoryError::NotFound)?;
        record.user.username = update.username.clone();
        update.name.clone_into(&mut record.user.name);
        if let Some(hash) = update.password_hash {
            hash.clone_into(&mut record.password_hash);
        }
        Ok(record.user.clone())
    }

    async fn admin_exists(&mut self) -> Result<bool, RepositoryError> {
        Ok(self.staged.users.iter().any(|c| c.user.is_admin))
    }

    async fn insert_category(&mut self, name: &str) -> Result<Category, RepositoryError> {
        let category = Category {
            id: CategoryId::new(next(&mut self.staged.sequences.category)),
            name: name.to_owned(),
        };
        self.staged.categories.push(category.clone());
        Ok(category)
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.staged.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.as_i32().cmp(&b.id.as_i32())));
        Ok(categories)
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.staged.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_product(&mut self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        if !self.staged.categories.iter().any(|c| c.id == draft.category_id) {
            return Err(RepositoryError::Conflict(format!(
                "category {} does not exist",
                draft.category_id
            )));
        }

        let product = Product {
            id: ProductId::new(next(&mut self.staged.sequences.product)),
            name: draft.name.clone(),
            quantity: draft.quantity,
            price: draft.price,
            category_id: draft.category_id,
            manufactured_on: draft.manufactured_on,
        };
        self.staged.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        edit: &ProductEdit,
    ) -> Result<Product, RepositoryError> {
        let product = self
            .staged
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        product.name.clone_from(&edit.name);
        product.price = edit.price;
        product.category_id = edit.category_id;
        product.manufactured_on = edit.manufactured_on;
        Ok(product.clone())
    }

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.staged.product(id).cloned())
    }

    async fn list_products(
        &mut self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut products: Vec<Product> = self
            .staged
            .products
            .iter()
            .filter(|p| category.is_none_or(|c| p.category_id == c))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.as_i32().cmp(&b.id.as_i32())));
        Ok(products)
    }

    async fn upsert_cart_line(
        &mut self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        if let Some(line) = self
            .staged
            .cart_lines
            .iter_mut()
            .find(|l| l.user_id == user && l.product_id == product)
        {
            line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                RepositoryError::Conflict("cart line quantity out of range".to_string())
            })?;
            return Ok(line.clone());
        }

        let line = CartLine {
            id: CartLineId::new(next(&mut self.staged.sequences.cart_line)),
            user_id: user,
            product_id: product,
            quantity,
        };
        self.staged.cart_lines.push(line.clone());
        Ok(line)
    }

    async fn cart_entries(&mut self, user: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        self.staged.cart_entries(user)
    }

    async fn lock_cart_entries(&mut self, user: UserId) -> Result<Vec<CartEntry>, RepositoryError> {
        self.staged.cart_entries(user)
    }

    async fn delete_cart_line(
        &mut self,
        user: UserId,
        line: CartLineId,
    ) -> Result<bool, RepositoryError> {
        self.trip(FailPoint::DeleteCartLine).await?;
        let before = self.staged.cart_lines.len();
        self.staged
            .cart_lines
            .retain(|l| !(l.id == line && l.user_id == user));
        Ok(self.staged.cart_lines.len() < before)
    }

    async fn insert_transaction(&mut self, user: UserId) -> Result<Transaction, RepositoryError> {
        let transaction = Transaction {
            id: TransactionId::new(next(&mut self.staged.sequences.transaction)),
            user_id: user,
            total: Decimal::ZERO,
            created_at: Utc::now(),
        };
        self.staged.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn decrement_stock(
        &mut self,
        product: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        self.trip(FailPoint::DecrementStock).await?;
        match self.staged.products.iter_mut().find(|p| p.id == product) {
            Some(p) if p.quantity >= quantity => {
                p.quantity -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_order_line(&mut self, order: NewOrderLine) -> Result<OrderLine, RepositoryError> {
        self.trip(FailPoint::InsertOrderLine).await?;
        let line = OrderLine {
            id: OrderLineId::new(next(&mut self.staged.sequences.order_line)),
            transaction_id: order.transaction_id,
            product_id: order.product_id,
            quantity: order.quantity,
            price: order.price,
        };
        self.staged.order_lines.push(line.clone());
        Ok(line)
    }

    async fn add_to_transaction_total(
        &mut self,
        id: TransactionId,
        amount: Decimal,
    ) -> Result<(), RepositoryError> {
        let transaction = self
            .staged
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RepositoryError::NotFound)?;
        transaction.total += amount;
        Ok(())
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, RepositoryError> {
        Ok(self.staged.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn transactions_for_user(
        &mut self,
        user: UserId,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let mut transactions: Vec<Transaction> = self
            .staged
            .transactions
            .iter()
            .filter(|t| t.user_id == user)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(transactions)
    }

    async fn order_entries(
        &mut self,
        transactions: &[TransactionId],
    ) -> Result<Vec<OrderEntry>, RepositoryError> {
        let mut lines: Vec<&OrderLine> = self
            .staged
            .order_lines
            .iter()
            .filter(|o| transactions.contains(&o.transaction_id))
            .collect();
        lines.sort_by_key(|o| (o.transaction_id.as_i32(), o.id.as_i32()));

        lines
            .into_iter()
            .map(|line| {
                let product = self.staged.product(line.product_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "order line {} references missing product {}",
                        line.id, line.product_id
                    ))
                })?;
                Ok(OrderEntry {
                    line: line.clone(),
                    product_name: product.name.clone(),
                })
            })
            .collect()
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.trip(FailPoint::Commit).await?;
        let Self {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        Ok(())
    }
}
