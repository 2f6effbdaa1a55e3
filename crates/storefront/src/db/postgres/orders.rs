//! Transaction and order line queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use stockroom_core::{OrderLineId, Price, ProductId, TransactionId, UserId};

use crate::db::RepositoryError;
use crate::models::{NewOrderLine, OrderEntry, OrderLine, Transaction};

const TRANSACTION_COLUMNS: &str = "id, user_id, total, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: TransactionId,
    user_id: UserId,
    total: Decimal,
    created_at: DateTime<Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            total: row.total,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    transaction_id: TransactionId,
    product_id: ProductId,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for order line {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            transaction_id: row.transaction_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderEntryRow {
    #[sqlx(flatten)]
    line: OrderLineRow,
    product_name: String,
}

pub(super) async fn insert_transaction(
    conn: &mut PgConnection,
    user: UserId,
) -> Result<Transaction, RepositoryError> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        "INSERT INTO stockroom.transactions (user_id, total) VALUES ($1, 0) RETURNING {TRANSACTION_COLUMNS}"
    ))
    .bind(user)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

pub(super) async fn insert_order_line(
    conn: &mut PgConnection,
    order: NewOrderLine,
) -> Result<OrderLine, RepositoryError> {
    let row = sqlx::query_as::<_, OrderLineRow>(
        r"
        INSERT INTO stockroom.order_lines (transaction_id, product_id, quantity, price)
        VALUES ($1, $2, $3, $4)
        RETURNING id, transaction_id, product_id, quantity, price
        ",
    )
    .bind(order.transaction_id)
    .bind(order.product_id)
    .bind(order.quantity)
    .bind(order.price.amount())
    .fetch_one(&mut *conn)
    .await?;

    row.try_into()
}

pub(super) async fn add_to_total(
    conn: &mut PgConnection,
    id: TransactionId,
    amount: Decimal,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE stockroom.transactions SET total = total + $2 WHERE id = $1")
        .bind(id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

pub(super) async fn find_transaction(
    conn: &mut PgConnection,
    id: TransactionId,
) -> Result<Option<Transaction>, RepositoryError> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM stockroom.transactions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Transaction::from))
}

pub(super) async fn for_user(
    conn: &mut PgConnection,
    user: UserId,
) -> Result<Vec<Transaction>, RepositoryError> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        r"
        SELECT {TRANSACTION_COLUMNS}
        FROM stockroom.transactions
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        "
    ))
    .bind(user)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Transaction::from).collect())
}

pub(super) async fn order_entries(
    conn: &mut PgConnection,
    transactions: &[TransactionId],
) -> Result<Vec<OrderEntry>, RepositoryError> {
    let ids: Vec<i32> = transactions.iter().map(TransactionId::as_i32).collect();
    let rows = sqlx::query_as::<_, OrderEntryRow>(
        r"
        SELECT o.id, o.transaction_id, o.product_id, o.quantity, o.price,
               p.name AS product_name
        FROM stockroom.order_lines o
        JOIN stockroom.products p ON p.id = o.product_id
        WHERE o.transaction_id = ANY($1)
        ORDER BY o.transaction_id, o.id
        ",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(OrderEntry {
                line: row.line.try_into()?,
                product_name: row.product_name,
            })
        })
        .collect()
}
