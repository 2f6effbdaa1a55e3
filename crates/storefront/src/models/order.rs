//! Transaction and order line domain types.
//!
//! Both are written once by checkout and never updated afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use stockroom_core::{OrderLineId, Price, ProductId, TransactionId, UserId};

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Unique transaction ID.
    pub id: TransactionId,
    /// Buyer.
    pub user_id: UserId,
    /// Σ price × quantity over the transaction's orders.
    pub total: Decimal,
    /// When checkout ran.
    pub created_at: DateTime<Utc>,
}

/// One purchased product within a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Unique order line ID.
    pub id: OrderLineId,
    /// Owning transaction.
    pub transaction_id: TransactionId,
    /// Purchased product.
    pub product_id: ProductId,
    /// Purchased units.
    pub quantity: i32,
    /// Unit price at purchase time.
    pub price: Price,
}

impl OrderLine {
    /// Snapshot price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.line_total(self.quantity)
    }
}

/// Fields for inserting an order line.
#[derive(Debug, Clone, Copy)]
pub struct NewOrderLine {
    /// Owning transaction.
    pub transaction_id: TransactionId,
    /// Purchased product.
    pub product_id: ProductId,
    /// Purchased units.
    pub quantity: i32,
    /// Unit price snapshot.
    pub price: Price,
}

/// An order line with its product name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    /// The order line.
    pub line: OrderLine,
    /// Current product name.
    pub product_name: String,
}

/// A transaction with its orders, for the history page.
#[derive(Debug, Clone)]
pub struct TransactionHistory {
    /// The transaction.
    pub transaction: Transaction,
    /// Its orders, in insertion order.
    pub orders: Vec<OrderEntry>,
}
