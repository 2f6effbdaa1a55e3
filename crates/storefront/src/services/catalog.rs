//! Catalog management: categories and products.

use thiserror::Error;
use tracing::instrument;

use stockroom_core::catalog::{
    CategoryName, CategoryNameError, DraftError, ProductDraft, ProductEdit, ProductFields,
};
use stockroom_core::{CategoryId, ProductId};

use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::models::{Category, CategoryWithProducts, Product};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Category name failed validation.
    #[error("{0}")]
    InvalidCategory(#[from] CategoryNameError),

    /// Product input failed validation.
    #[error("{0}")]
    InvalidProduct(#[from] DraftError),

    /// Referenced category does not exist.
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    /// Referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog service.
pub struct CatalogService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CatalogService<'a, S> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidCategory` for a blank name.
    #[instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<Category, CatalogError> {
        let name = CategoryName::parse(name)?;

        let mut uow = self.store.begin().await?;
        let category = uow.insert_category(name.as_str()).await?;
        uow.commit().await?;

        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Create a product from raw form input.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidProduct` for invalid input and
    /// `CatalogError::CategoryNotFound` for an unknown category.
    pub async fn create_product(&self, fields: ProductFields<'_>) -> Result<Product, CatalogError> {
        let draft = ProductDraft::parse(fields)?;
        self.add_product(&draft).await
    }

    /// Create a product from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` for an unknown category.
    #[instrument(skip(self, draft), fields(name = %draft.name, category_id = %draft.category_id))]
    pub async fn add_product(&self, draft: &ProductDraft) -> Result<Product, CatalogError> {
        let mut uow = self.store.begin().await?;
        if uow.find_category(draft.category_id).await?.is_none() {
            return Err(CatalogError::CategoryNotFound(draft.category_id));
        }
        let product = uow.insert_product(draft).await?;
        uow.commit().await?;

        tracing::info!(product_id = %product.id, quantity = product.quantity, "Product created");
        Ok(product)
    }

    /// Edit a product's name, price, category and manufacture date.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidProduct` for invalid input and
    /// `CatalogError::ProductNotFound` / `CatalogError::CategoryNotFound` for
    /// unknown references.
    #[instrument(skip(self, fields))]
    pub async fn update_product(
        &self,
        id: ProductId,
        fields: ProductFields<'_>,
    ) -> Result<Product, CatalogError> {
        let edit = ProductEdit::parse(fields)?;

        let mut uow = self.store.begin().await?;
        if uow.find_category(edit.category_id).await?.is_none() {
            return Err(CatalogError::CategoryNotFound(edit.category_id));
        }
        let product = uow
            .update_product(id, &edit)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::ProductNotFound(id),
                other => CatalogError::Repository(other),
            })?;
        uow.commit().await?;

        tracing::info!(price = %product.price, "Product updated");
        Ok(product)
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.list_categories().await?)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` for an unknown product.
    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let mut uow = self.store.begin().await?;
        uow.find_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    /// One category with its products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` for an unknown category.
    pub async fn category(&self, id: CategoryId) -> Result<CategoryWithProducts, CatalogError> {
        let mut uow = self.store.begin().await?;
        let category = uow
            .find_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))?;
        let products = uow.list_products(Some(id)).await?;
        Ok(CategoryWithProducts { category, products })
    }

    /// Every category with its products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if a query fails.
    pub async fn overview(&self) -> Result<Vec<CategoryWithProducts>, CatalogError> {
        let mut uow = self.store.begin().await?;
        let categories = uow.list_categories().await?;
        let mut products = uow.list_products(None).await?;
        drop(uow);

        Ok(categories
            .into_iter()
            .map(|category| {
                let (mine, rest): (Vec<Product>, Vec<Product>) = products
                    .drain(..)
                    .partition(|p| p.category_id == category.id);
                products = rest;
                CategoryWithProducts {
                    category,
                    products: mine,
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn fields(category_id: &str) -> ProductFields<'_> {
        ProductFields {
            name: "Hammer",
            quantity: "5",
            price: "12.50",
            category_id,
            manufactured_on: "2024-05-01",
        }
    }

    #[tokio::test]
    async fn blank_category_name_is_rejected() {
        let store = MemoryStore::new();
        let err = CatalogService::new(&store)
            .create_category("   ")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Name is required.");
    }

    #[tokio::test]
    async fn product_needs_existing_category() {
        let store = MemoryStore::new();
        let err = CatalogService::new(&store)
            .create_product(fields("99"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound(id) if id.as_i32() == 99));
    }

    #[tokio::test]
    async fn missing_fields_are_reported() {
        let store = MemoryStore::new();
        let err = CatalogService::new(&store)
            .create_product(ProductFields::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "All fields are required.");
    }

    #[tokio::test]
    async fn overview_groups_products_by_category() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let tools = catalog.create_category("Tools").await.unwrap();
        let garden = catalog.create_category("Garden").await.unwrap();
        let tools_id = tools.id.to_string();
        let garden_id = garden.id.to_string();
        catalog.create_product(fields(&tools_id)).await.unwrap();
        catalog
            .create_product(ProductFields {
                name: "Rake",
                ..fields(&garden_id)
            })
            .await
            .unwrap();

        let overview = catalog.overview().await.unwrap();
        let names: Vec<(&str, Vec<&str>)> = overview
            .iter()
            .map(|c| {
                (
                    c.category.name.as_str(),
                    c.products.iter().map(|p| p.name.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![("Garden", vec!["Rake"]), ("Tools", vec!["Hammer"])]
        );
    }

    #[tokio::test]
    async fn update_changes_price_but_not_stock() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let tools = catalog.create_category("Tools").await.unwrap();
        let tools_id = tools.id.to_string();
        let hammer = catalog.create_product(fields(&tools_id)).await.unwrap();

        let updated = catalog
            .update_product(
                hammer.id,
                ProductFields {
                    price: "20",
                    quantity: "",
                    ..fields(&tools_id)
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price.to_string(), "20.00");
        assert_eq!(updated.quantity, 5);
    }

    #[tokio::test]
    async fn unknown_category_page_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            CatalogService::new(&store).category(CategoryId::new(1)).await,
            Err(CatalogError::CategoryNotFound(_))
        ));
    }
}
