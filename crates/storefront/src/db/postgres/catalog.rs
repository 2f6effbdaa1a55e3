//! Category and product queries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;

use stockroom_core::catalog::{ProductDraft, ProductEdit};
use stockroom_core::{CategoryId, Price, ProductId};

use crate::db::RepositoryError;
use crate::models::{Category, Product};

pub(super) const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.quantity, p.price, p.category_id, p.manufactured_on";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    name: String,
    quantity: i32,
    price: Decimal,
    category_id: CategoryId,
    manufactured_on: NaiveDate,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            quantity: row.quantity,
            price,
            category_id: row.category_id,
            manufactured_on: row.manufactured_on,
        })
    }
}

pub(super) async fn insert_category(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Category, RepositoryError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO stockroom.categories (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

pub(super) async fn list_categories(
    conn: &mut PgConnection,
) -> Result<Vec<Category>, RepositoryError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name FROM stockroom.categories ORDER BY name, id",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Category::from).collect())
}

pub(super) async fn find_category(
    conn: &mut PgConnection,
    id: CategoryId,
) -> Result<Option<Category>, RepositoryError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name FROM stockroom.categories WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Category::from))
}

pub(super) async fn insert_product(
    conn: &mut PgConnection,
    draft: &ProductDraft,
) -> Result<Product, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r"
        INSERT INTO stockroom.products AS p (name, quantity, price, category_id, manufactured_on)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PRODUCT_COLUMNS}
        "
    ))
    .bind(&draft.name)
    .bind(draft.quantity)
    .bind(draft.price.amount())
    .bind(draft.category_id)
    .bind(draft.manufactured_on)
    .fetch_one(&mut *conn)
    .await?;

    row.try_into()
}

pub(super) async fn update_product(
    conn: &mut PgConnection,
    id: ProductId,
    edit: &ProductEdit,
) -> Result<Product, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r"
        UPDATE stockroom.products AS p
        SET name = $2, price = $3, category_id = $4, manufactured_on = $5, updated_at = now()
        WHERE p.id = $1
        RETURNING {PRODUCT_COLUMNS}
        "
    ))
    .bind(id)
    .bind(&edit.name)
    .bind(edit.price.amount())
    .bind(edit.category_id)
    .bind(edit.manufactured_on)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.try_into()
}

pub(super) async fn find_product(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM stockroom.products p WHERE p.id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Product::try_from).transpose()
}

pub(super) async fn list_products(
    conn: &mut PgConnection,
    category: Option<CategoryId>,
) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        r"
        SELECT {PRODUCT_COLUMNS}
        FROM stockroom.products p
        WHERE $1::INTEGER IS NULL OR p.category_id = $1
        ORDER BY p.name, p.id
        "
    ))
    .bind(category)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Product::try_from).collect()
}

pub(super) async fn decrement_stock(
    conn: &mut PgConnection,
    id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE stockroom.products
        SET quantity = quantity - $2, updated_at = now()
        WHERE id = $1 AND quantity >= $2
        ",
    )
    .bind(id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
