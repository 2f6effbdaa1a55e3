//! Cart operations.
//!
//! The stock check here is advisory: it compares the requested amount with
//! the stock at add time. Checkout re-checks against locked rows.

use thiserror::Error;
use tracing::instrument;

use stockroom_core::{CartLineId, ProductId, UserId};

use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::models::{CartLine, CartSummary};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity below one.
    #[error("Quantity must be at least 1.")]
    InvalidQuantity,

    /// Product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds current stock.
    #[error("Not enough stock.")]
    NotEnoughStock {
        /// Requested units.
        requested: i32,
        /// Units in stock.
        available: i32,
    },

    /// The line would hold more units than a quantity can represent.
    #[error("Quantity is too large.")]
    QuantityTooLarge,

    /// Line does not exist or belongs to someone else.
    #[error("cart line {0} not found")]
    LineNotFound(CartLineId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CartService<'a, S> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Add units of a product to the user's cart.
    ///
    /// A second add for the same product increases the existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` below one,
    /// `CartError::ProductNotFound` for an unknown product and
    /// `CartError::NotEnoughStock` when `quantity` exceeds current stock and
    /// `CartError::QuantityTooLarge` when the line total would overflow.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartLine, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let mut uow = self.store.begin().await?;
        let stocked = uow
            .find_product(product)
            .await?
            .ok_or(CartError::ProductNotFound(product))?;
        if quantity > stocked.quantity {
            return Err(CartError::NotEnoughStock {
                requested: quantity,
                available: stocked.quantity,
            });
        }

        let in_cart = uow
            .cart_entries(user)
            .await?
            .into_iter()
            .find(|e| e.product.id == product)
            .map_or(0, |e| e.line.quantity);
        if in_cart.checked_add(quantity).is_none() {
            return Err(CartError::QuantityTooLarge);
        }

        let line = uow.upsert_cart_line(user, product, quantity).await?;
        uow.commit().await?;

        tracing::debug!(cart_line_id = %line.id, line_quantity = line.quantity, "Added to cart");
        Ok(line)
    }

    /// The user's cart with live prices.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn summary(&self, user: UserId) -> Result<CartSummary, CartError> {
        let mut uow = self.store.begin().await?;
        let entries = uow.cart_entries(user).await?;
        Ok(CartSummary { entries })
    }

    /// Remove one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the user has no such line.
    #[instrument(skip(self))]
    pub async fn remove(&self, user: UserId, line: CartLineId) -> Result<(), CartError> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_cart_line(user, line).await? {
            return Err(CartError::LineNotFound(line));
        }
        uow.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use stockroom_core::Price;
    use stockroom_core::catalog::ProductDraft;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Product;
    use crate::services::auth::AuthService;
    use crate::services::catalog::CatalogService;

    async fn setup(stock: i32) -> (MemoryStore, UserId, Product) {
        let store = MemoryStore::new();
        let user = AuthService::new(&store)
            .register("carol", "s3cret-pass", "")
            .await
            .unwrap();
        let catalog = CatalogService::new(&store);
        let category = catalog.create_category("Tools").await.unwrap();
        let product = catalog
            .add_product(
                &ProductDraft::new(
                    "Hammer",
                    stock,
                    Price::from_cents(1000).unwrap(),
                    category.id,
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                )
                .unwrap(),
            )
            .await
            .unwrap();
        (store, user.id, product)
    }

    #[tokio::test]
    async fn repeated_adds_accumulate_into_one_line() {
        let (store, user, hammer) = setup(10).await;
        let cart = CartService::new(&store);

        let first = cart.add(user, hammer.id, 2).await.unwrap();
        let second = cart.add(user, hammer.id, 3).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 5);

        let summary = cart.summary(user).await.unwrap();
        assert_eq!(summary.entries.len(), 1);
        assert_eq!(summary.item_count(), 5);
        assert_eq!(summary.total(), Decimal::new(5000, 2));
    }

    #[tokio::test]
    async fn quantity_above_stock_is_rejected() {
        let (store, user, hammer) = setup(3).await;
        let cart = CartService::new(&store);

        let err = cart.add(user, hammer.id, 4).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::NotEnoughStock {
                requested: 4,
                available: 3
            }
        ));
        assert_eq!(err.to_string(), "Not enough stock.");
        assert!(cart.summary(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn line_quantity_cannot_overflow() {
        let (store, user, hammer) = setup(i32::MAX).await;
        let cart = CartService::new(&store);
        cart.add(user, hammer.id, i32::MAX).await.unwrap();

        let err = cart.add(user, hammer.id, 1).await.unwrap_err();
        assert!(matches!(err, CartError::QuantityTooLarge));
        assert_eq!(err.to_string(), "Quantity is too large.");
        assert_eq!(cart.summary(user).await.unwrap().item_count(), i64::from(i32::MAX));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let (store, user, hammer) = setup(3).await;
        assert!(matches!(
            CartService::new(&store).add(user, hammer.id, 0).await,
            Err(CartError::InvalidQuantity)
        ));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (store, user, _) = setup(3).await;
        assert!(matches!(
            CartService::new(&store).add(user, ProductId::new(404), 1).await,
            Err(CartError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn lines_can_only_be_removed_by_their_owner() {
        let (store, user, hammer) = setup(3).await;
        let other = AuthService::new(&store)
            .register("dave", "s3cret-pass", "")
            .await
            .unwrap();
        let cart = CartService::new(&store);
        let line = cart.add(user, hammer.id, 1).await.unwrap();

        assert!(matches!(
            cart.remove(other.id, line.id).await,
            Err(CartError::LineNotFound(_))
        ));
        cart.remove(user, line.id).await.unwrap();
        assert!(cart.summary(user).await.unwrap().is_empty());
    }
}
