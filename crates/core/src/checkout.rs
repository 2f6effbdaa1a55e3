//! Checkout planning.
//!
//! A [`CheckoutPlan`] is the validated description of what one checkout will
//! write: one order per cart line with its price snapshot, the total demand
//! per product, and the grand total. Building a plan performs no I/O; the
//! storefront builds it from cart lines it has locked and then applies it
//! inside a single database transaction.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CartLineId, Price, ProductId};

/// One cart line resolved against its product's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    /// The cart line being consumed.
    pub cart_line_id: CartLineId,
    /// The purchased product.
    pub product_id: ProductId,
    /// Product name, for messages.
    pub product_name: String,
    /// Requested quantity.
    pub quantity: i32,
    /// Current product price, frozen into the order.
    pub unit_price: Price,
    /// Current product stock.
    pub in_stock: i32,
}

/// An order line the checkout will create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOrder {
    /// The cart line this order consumes.
    pub cart_line_id: CartLineId,
    /// The purchased product.
    pub product_id: ProductId,
    /// Purchased quantity.
    pub quantity: i32,
    /// Price snapshot.
    pub unit_price: Price,
}

impl PlannedOrder {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.line_total(self.quantity)
    }
}

/// Why a checkout cannot go ahead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutRejection {
    /// The user has no cart lines.
    #[error("Cart is empty.")]
    EmptyCart,
    /// A cart line holds a quantity below one.
    #[error("cart line {cart_line_id} has invalid quantity {quantity}")]
    InvalidQuantity {
        /// Offending line.
        cart_line_id: CartLineId,
        /// Stored quantity.
        quantity: i32,
    },
    /// Total demand for a product exceeds its stock.
    #[error("Not enough stock for {product_name}: requested {requested}, available {available}.")]
    InsufficientStock {
        /// Product short of stock.
        product_id: ProductId,
        /// Product name.
        product_name: String,
        /// Summed quantity across the cart.
        requested: i64,
        /// Current stock.
        available: i32,
    },
}

/// A validated checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutPlan {
    orders: Vec<PlannedOrder>,
    total: Decimal,
}

impl CheckoutPlan {
    /// Build a plan from resolved cart lines.
    ///
    /// Demand is summed per product before comparing against stock, so two
    /// lines for the same product cannot each pass on their own and jointly
    /// oversell it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutRejection::EmptyCart`] for no lines,
    /// [`CheckoutRejection::InvalidQuantity`] for a line below one, and
    /// [`CheckoutRejection::InsufficientStock`] for the first product (in cart
    /// order) whose demand exceeds its stock.
    pub fn build<I>(lines: I) -> Result<Self, CheckoutRejection>
    where
        I: IntoIterator<Item = CheckoutLine>,
    {
        let lines: Vec<CheckoutLine> = lines.into_iter().collect();
        if lines.is_empty() {
            return Err(CheckoutRejection::EmptyCart);
        }

        let mut demand: HashMap<ProductId, i64> = HashMap::new();
        for line in &lines {
            if line.quantity < 1 {
                return Err(CheckoutRejection::InvalidQuantity {
                    cart_line_id: line.cart_line_id,
                    quantity: line.quantity,
                });
            }
            *demand.entry(line.product_id).or_default() += i64::from(line.quantity);
        }

        for line in &lines {
            let requested = demand.get(&line.product_id).copied().unwrap_or_default();
            if requested > i64::from(line.in_stock) {
                return Err(CheckoutRejection::InsufficientStock {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    requested,
                    available: line.in_stock,
                });
            }
        }

        let orders: Vec<PlannedOrder> = lines
            .into_iter()
            .map(|line| PlannedOrder {
                cart_line_id: line.cart_line_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        let total = orders.iter().map(PlannedOrder::line_total).sum();

        Ok(Self { orders, total })
    }

    /// Orders to create, in cart order.
    #[must_use]
    pub fn orders(&self) -> &[PlannedOrder] {
        &self.orders
    }

    /// Sum of all line totals.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Total units purchased per product.
    #[must_use]
    pub fn demand(&self) -> HashMap<ProductId, i64> {
        let mut demand = HashMap::new();
        for order in &self.orders {
            *demand.entry(order.product_id).or_default() += i64::from(order.quantity);
        }
        demand
    }
}
