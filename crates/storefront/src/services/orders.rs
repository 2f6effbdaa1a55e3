//! Order history.

use std::collections::HashMap;

use tracing::instrument;

use stockroom_core::{TransactionId, UserId};

use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::models::{OrderEntry, TransactionHistory};

/// Read-only view over a user's completed checkouts.
pub struct OrderHistoryService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> OrderHistoryService<'a, S> {
    /// Create a new order history service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The user's transactions, newest first, each with its orders.
    ///
    /// Orders for all transactions are fetched in one query and grouped here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    #[instrument(skip(self))]
    pub async fn history(&self, user: UserId) -> Result<Vec<TransactionHistory>, RepositoryError> {
        let mut uow = self.store.begin().await?;
        let transactions = uow.transactions_for_user(user).await?;
        if transactions.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<TransactionId> = transactions.iter().map(|t| t.id).collect();
        let mut grouped: HashMap<TransactionId, Vec<OrderEntry>> = HashMap::new();
        for entry in uow.order_entries(&ids).await? {
            grouped
                .entry(entry.line.transaction_id)
                .or_default()
                .push(entry);
        }

        Ok(transactions
            .into_iter()
            .map(|transaction| TransactionHistory {
                orders: grouped.remove(&transaction.id).unwrap_or_default(),
                transaction,
            })
            .collect())
    }
}
