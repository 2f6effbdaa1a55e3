//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Tools
//!     products:
//!       - name: Claw hammer
//!         quantity: 25
//!         price: "12.50"
//!         manufactured_on: 2025-03-01
//! ```
//!
//! Existing categories are matched by name and reused. Products go through
//! the same validation as the admin form. The whole file is validated first
//! and then written in one unit of work, so a failed seed writes nothing.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use stockroom_core::catalog::{CategoryName, ProductDraft};
use stockroom_core::{CategoryId, Price};
use stockroom_storefront::db::{PgStore, Store, UnitOfWork};

use super::{CommandError, connect};

/// Top-level seed document.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
}

/// A category and its products.
#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// One product. Price is a string so `12.50` keeps its exact decimal value.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub quantity: i32,
    pub price: String,
    pub manufactured_on: NaiveDate,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub categories_reused: usize,
    pub products_created: usize,
}

/// Parse and validate a seed document.
///
/// Every product is checked against the catalog rules; category references
/// are filled in later, so a placeholder ID is used here.
pub fn parse(content: &str) -> Result<SeedFile, CommandError> {
    let file: SeedFile = serde_yaml::from_str(content)?;
    for category in &file.categories {
        if category.name.trim().is_empty() {
            return Err(CommandError::InvalidSeed("category without a name".to_string()));
        }
        for product in &category.products {
            draft(product, CategoryId::new(0)).map_err(|e| {
                CommandError::InvalidSeed(format!("{} / {}: {e}", category.name, product.name))
            })?;
        }
    }
    Ok(file)
}

fn draft(product: &SeedProduct, category_id: CategoryId) -> Result<ProductDraft, String> {
    let price = Price::parse(&product.price).map_err(|e| e.to_string())?;
    ProductDraft::new(
        &product.name,
        product.quantity,
        price,
        category_id,
        product.manufactured_on,
    )
    .map_err(|e| e.to_string())
}

/// Seed categories and products from `path`.
pub async fn catalog(path: &Path) -> Result<SeedSummary, CommandError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let file = parse(&content)?;
    info!(path = %path.display(), categories = file.categories.len(), "Parsed seed file");

    let store = PgStore::new(connect().await?);
    apply(&store, &file).await
}

/// Write a parsed seed document to `store` in a single unit of work.
pub async fn apply<S: Store>(store: &S, file: &SeedFile) -> Result<SeedSummary, CommandError> {
    let mut uow = store.begin().await?;
    let mut known = uow.list_categories().await?;

    let mut summary = SeedSummary::default();
    for seed in &file.categories {
        let name = CategoryName::parse(&seed.name)
            .map_err(|e| CommandError::InvalidSeed(format!("{}: {e}", seed.name)))?;
        let category_id = if let Some(found) = known.iter().find(|c| c.name == name.as_str()) {
            summary.categories_reused += 1;
            found.id
        } else {
            summary.categories_created += 1;
            let created = uow.insert_category(name.as_str()).await?;
            let id = created.id;
            known.push(created);
            id
        };

        for product in &seed.products {
            let draft = draft(product, category_id).map_err(CommandError::InvalidSeed)?;
            uow.insert_product(&draft).await?;
            summary.products_created += 1;
        }
    }
    uow.commit().await?;

    info!(
        categories_created = summary.categories_created,
        categories_reused = summary.categories_reused,
        products_created = summary.products_created,
        "Seeding complete!"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stockroom_storefront::db::{FailPoint, MemoryStore};

    use super::*;

    #[test]
    fn parses_bundled_catalog() {
        let file = parse(include_str!("../../seed/catalog.yaml")).unwrap();
        assert!(!file.categories.is_empty());
        assert!(file.categories.iter().all(|c| !c.products.is_empty()));
    }

    #[test]
    fn rejects_invalid_price() {
        let err = parse(
            "categories:\n  - name: Tools\n    products:\n      - name: Saw\n        quantity: 1\n        price: \"-3\"\n        manufactured_on: 2024-01-01\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Tools / Saw"));
    }

    #[test]
    fn rejects_negative_quantity() {
        let err = parse(
            "categories:\n  - name: Tools\n    products:\n      - name: Saw\n        quantity: -1\n        price: \"3\"\n        manufactured_on: 2024-01-01\n",
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::InvalidSeed(_)));
    }

    const TWO_CATEGORIES: &str = "categories:\n  - name: Tools\n    products:\n      - name: Saw\n        quantity: 1\n        price: \"3\"\n        manufactured_on: 2024-01-01\n  - name: Garden\n    products:\n      - name: Rake\n        quantity: 2\n        price: \"8.25\"\n        manufactured_on: 2024-02-01\n";

    #[tokio::test]
    async fn seeds_and_reuses_categories() {
        let store = MemoryStore::new();
        let file = parse(TWO_CATEGORIES).unwrap();

        let first = apply(&store, &file).await.unwrap();
        assert_eq!(first.categories_created, 2);
        assert_eq!(first.products_created, 2);

        let second = apply(&store, &file).await.unwrap();
        assert_eq!(second.categories_created, 0);
        assert_eq!(second.categories_reused, 2);

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.list_categories().await.unwrap().len(), 2);
        assert_eq!(uow.list_products(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn failed_seed_writes_nothing() {
        let store = MemoryStore::new();
        let file = parse(TWO_CATEGORIES).unwrap();
        store.fail_once(FailPoint::Commit).await;

        assert!(apply(&store, &file).await.is_err());

        let mut uow = store.begin().await.unwrap();
        assert!(uow.list_categories().await.unwrap().is_empty());
        assert!(uow.list_products(None).await.unwrap().is_empty());
    }

    #[test]
    fn empty_document_has_no_categories() {
        assert!(parse("categories: []").unwrap().categories.is_empty());
    }
}
