//! Cart domain types.

use rust_decimal::Decimal;

use stockroom_core::{CartLineId, ProductId, UserId};

use super::catalog::Product;

/// A pending cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Unique line ID.
    pub id: CartLineId,
    /// Owner.
    pub user_id: UserId,
    /// Product to buy.
    pub product_id: ProductId,
    /// Units to buy, at least one.
    pub quantity: i32,
}

/// A cart line joined with its product's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    /// The line.
    pub line: CartLine,
    /// The product as it is now.
    pub product: Product,
}

impl CartEntry {
    /// Live price × quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price.line_total(self.line.quantity)
    }
}

/// A user's cart with live totals.
#[derive(Debug, Clone, Default)]
pub struct CartSummary {
    /// Lines in insertion order.
    pub entries: Vec<CartEntry>,
}

impl CartSummary {
    /// Sum of line subtotals at current prices.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(CartEntry::subtotal).sum()
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.entries
            .iter()
            .map(|entry| i64::from(entry.line.quantity))
            .sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
