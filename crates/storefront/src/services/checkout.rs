//! Checkout: turn a user's cart into a transaction with order lines.
//!
//! Everything happens in one unit of work. Cart lines and their products are
//! locked, a [`CheckoutPlan`] is built from them, and then for each planned
//! order the stock is decremented (conditionally), the order line is written
//! with the price snapshot, the transaction total grows and the cart line is
//! deleted. Any error drops the unit of work, which undoes all of it.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use stockroom_core::checkout::{CheckoutLine, CheckoutPlan, CheckoutRejection};
use stockroom_core::{ProductId, TransactionId, UserId};

use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::error::add_breadcrumb;
use crate::models::{CartEntry, NewOrderLine};

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines. Nothing was written.
    #[error("Cart is empty.")]
    EmptyCart,

    /// A product does not have enough stock. Nothing was written.
    #[error("Not enough stock for {product_name}.")]
    InsufficientStock {
        /// Product short of stock.
        product_id: ProductId,
        /// Product name.
        product_name: String,
        /// Units the cart asked for.
        requested: i64,
        /// Units in stock.
        available: i32,
    },

    /// A stored cart line is invalid.
    #[error("invalid cart: {0}")]
    InvalidCart(CheckoutRejection),

    /// Repository/database error. Nothing was written.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<CheckoutRejection> for CheckoutError {
    fn from(rejection: CheckoutRejection) -> Self {
        match rejection {
            CheckoutRejection::EmptyCart => Self::EmptyCart,
            CheckoutRejection::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            } => Self::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            },
            invalid @ CheckoutRejection::InvalidQuantity { .. } => Self::InvalidCart(invalid),
        }
    }
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// The new transaction.
    pub transaction_id: TransactionId,
    /// Its total.
    pub total: Decimal,
    /// Number of order lines written.
    pub order_count: usize,
}

/// Checkout service.
pub struct CheckoutService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CheckoutService<'a, S> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Place an order for everything in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart,
    /// `CheckoutError::InsufficientStock` when any product is short, and
    /// `CheckoutError::Repository` on storage failure. No error leaves a
    /// partial write behind.
    #[instrument(skip(self), fields(transaction_id))]
    pub async fn place_order(&self, user: UserId) -> Result<Receipt, CheckoutError> {
        let mut uow = self.store.begin().await?;

        let entries = uow.lock_cart_entries(user).await?;
        let names: HashMap<ProductId, String> = entries
            .iter()
            .map(|e| (e.product.id, e.product.name.clone()))
            .collect();
        let plan = CheckoutPlan::build(entries.into_iter().map(checkout_line))?;

        let transaction = uow.insert_transaction(user).await?;
        tracing::Span::current().record("transaction_id", tracing::field::display(transaction.id));

        for order in plan.orders() {
            if !uow.decrement_stock(order.product_id, order.quantity).await? {
                // Rows are locked, so only a writer bypassing the lock gets here.
                tracing::warn!(product_id = %order.product_id, "Stock changed during checkout");
                let available = uow
                    .find_product(order.product_id)
                    .await?
                    .map_or(0, |p| p.quantity);
                return Err(CheckoutError::InsufficientStock {
                    product_id: order.product_id,
                    product_name: names.get(&order.product_id).cloned().unwrap_or_default(),
                    requested: i64::from(order.quantity),
                    available,
                });
            }

            uow.insert_order_line(NewOrderLine {
                transaction_id: transaction.id,
                product_id: order.product_id,
                quantity: order.quantity,
                price: order.unit_price,
            })
            .await?;
            uow.add_to_transaction_total(transaction.id, order.line_total())
                .await?;
            if !uow.delete_cart_line(user, order.cart_line_id).await? {
                return Err(RepositoryError::NotFound.into());
            }
        }

        uow.commit().await?;

        let receipt = Receipt {
            transaction_id: transaction.id,
            total: plan.total(),
            order_count: plan.orders().len(),
        };
        tracing::info!(total = %receipt.total, orders = receipt.order_count, "Order placed");
        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("transaction_id", &receipt.transaction_id.to_string())]),
        );
        Ok(receipt)
    }
}

fn checkout_line(entry: CartEntry) -> CheckoutLine {
    CheckoutLine {
        cart_line_id: entry.line.id,
        product_id: entry.product.id,
        product_name: entry.product.name,
        quantity: entry.line.quantity,
        unit_price: entry.product.price,
        in_stock: entry.product.quantity,
    }
}
