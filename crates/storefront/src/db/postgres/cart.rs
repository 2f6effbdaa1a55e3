//! Cart queries.

use sqlx::PgConnection;

use stockroom_core::{CartLineId, ProductId, UserId};

use super::catalog::{PRODUCT_COLUMNS, ProductRow};
use crate::db::RepositoryError;
use crate::models::{CartEntry, CartLine, Product};

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartEntryRow {
    line_id: CartLineId,
    user_id: UserId,
    line_quantity: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<CartEntryRow> for CartEntry {
    type Error = RepositoryError;

    fn try_from(row: CartEntryRow) -> Result<Self, Self::Error> {
        let product: Product = row.product.try_into()?;
        Ok(Self {
            line: CartLine {
                id: row.line_id,
                user_id: row.user_id,
                product_id: product.id,
                quantity: row.line_quantity,
            },
            product,
        })
    }
}

pub(super) async fn upsert_line(
    conn: &mut PgConnection,
    user: UserId,
    product: ProductId,
    quantity: i32,
) -> Result<CartLine, RepositoryError> {
    let row = sqlx::query_as::<_, CartLineRow>(
        r"
        INSERT INTO stockroom.cart_lines AS c (user_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = c.quantity + EXCLUDED.quantity
        RETURNING c.id, c.user_id, c.product_id, c.quantity
        ",
    )
    .bind(user)
    .bind(product)
    .bind(quantity)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Cart query for one user. Locking reads take product rows in id order.
fn entries_query(lock: bool) -> String {
    let (order, locking) = if lock {
        ("p.id, c.id", "FOR UPDATE OF c, p")
    } else {
        ("c.id", "")
    };
    format!(
        r"
        SELECT c.id AS line_id, c.user_id, c.quantity AS line_quantity, {PRODUCT_COLUMNS}
        FROM stockroom.cart_lines c
        JOIN stockroom.products p ON p.id = c.product_id
        WHERE c.user_id = $1
        ORDER BY {order}
        {locking}
        "
    )
}

async fn entries(
    conn: &mut PgConnection,
    user: UserId,
    lock: bool,
) -> Result<Vec<CartEntry>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartEntryRow>(&entries_query(lock))
        .bind(user)
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(CartEntry::try_from).collect()
}

pub(super) async fn cart_entries(
    conn: &mut PgConnection,
    user: UserId,
) -> Result<Vec<CartEntry>, RepositoryError> {
    entries(conn, user, false).await
}

pub(super) async fn lock_cart_entries(
    conn: &mut PgConnection,
    user: UserId,
) -> Result<Vec<CartEntry>, RepositoryError> {
    entries(conn, user, true).await
}

pub(super) async fn delete_line(
    conn: &mut PgConnection,
    user: UserId,
    line: CartLineId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM stockroom.cart_lines WHERE id = $1 AND user_id = $2")
        .bind(line)
        .bind(user)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locking_query_orders_by_product() {
        let query = entries_query(true);
        assert!(query.contains("ORDER BY p.id, c.id"));
        assert!(query.contains("FOR UPDATE OF c, p"));
    }

    #[test]
    fn listing_query_keeps_cart_order_without_locks() {
        let query = entries_query(false);
        assert!(query.contains("ORDER BY c.id"));
        assert!(!query.contains("FOR UPDATE"));
    }
}
