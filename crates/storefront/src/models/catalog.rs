//! Category and product domain types.

use chrono::NaiveDate;

use stockroom_core::{CategoryId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Non-blank name.
    pub name: String,
}

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Units in stock, never negative.
    pub quantity: i32,
    /// Current unit price.
    pub price: Price,
    /// Owning category.
    pub category_id: CategoryId,
    /// Manufacture date.
    pub manufactured_on: NaiveDate,
}

impl Product {
    /// Whether any units are left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// A category with its products, for catalog pages.
#[derive(Debug, Clone)]
pub struct CategoryWithProducts {
    /// The category.
    pub category: Category,
    /// Products in the category, ordered by name.
    pub products: Vec<Product>,
}
