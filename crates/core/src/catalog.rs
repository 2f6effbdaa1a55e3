//! Catalog input validation.
//!
//! Admin forms submit everything as text. [`CategoryName::parse`],
//! [`ProductDraft::parse`] and [`ProductEdit::parse`] turn that text into
//! validated values; the error `Display` strings are shown to the admin as-is.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Price, PriceError};

/// Date format accepted for manufacture dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum length of category and product names.
pub const MAX_NAME_LENGTH: usize = 200;

/// Errors from validating a category name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryNameError {
    /// Blank name.
    #[error("Name is required.")]
    Empty,
    /// Name longer than [`MAX_NAME_LENGTH`].
    #[error("Name must be at most {max} characters.")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A non-blank category name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    /// Parse a category name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed name is empty or too long.
    pub fn parse(s: &str) -> Result<Self, CategoryNameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CategoryNameError::Empty);
        }
        if s.chars().count() > MAX_NAME_LENGTH {
            return Err(CategoryNameError::TooLong {
                max: MAX_NAME_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from validating product input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// At least one field was left blank.
    #[error("All fields are required.")]
    MissingFields,
    /// Name longer than [`MAX_NAME_LENGTH`].
    #[error("Name must be at most {max} characters.")]
    NameTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Quantity is not a non-negative whole number.
    #[error("Quantity must be a whole number of zero or more.")]
    InvalidQuantity,
    /// Price failed validation.
    #[error("Invalid price: {0}.")]
    InvalidPrice(#[from] PriceError),
    /// Category reference is not an id.
    #[error("Choose a category.")]
    InvalidCategory,
    /// Date is not `YYYY-MM-DD`.
    #[error("Manufacture date must be in YYYY-MM-DD format.")]
    InvalidDate,
}

/// Raw product form fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFields<'a> {
    /// Product name.
    pub name: &'a str,
    /// Stock quantity.
    pub quantity: &'a str,
    /// Unit price.
    pub price: &'a str,
    /// Category id.
    pub category_id: &'a str,
    /// Manufacture date (`YYYY-MM-DD`).
    pub manufactured_on: &'a str,
}

/// A validated new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Product name, trimmed.
    pub name: String,
    /// Initial stock, never negative.
    pub quantity: i32,
    /// Unit price.
    pub price: Price,
    /// Owning category.
    pub category_id: CategoryId,
    /// Manufacture date.
    pub manufactured_on: NaiveDate,
}

impl ProductDraft {
    /// Build a draft from typed values.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or too long, or the quantity is
    /// negative.
    pub fn new(
        name: &str,
        quantity: i32,
        price: Price,
        category_id: CategoryId,
        manufactured_on: NaiveDate,
    ) -> Result<Self, DraftError> {
        if quantity < 0 {
            return Err(DraftError::InvalidQuantity);
        }
        Ok(Self {
            name: parse_name(name)?,
            quantity,
            price,
            category_id,
            manufactured_on,
        })
    }

    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MissingFields`] when any field is blank, otherwise
    /// the first field-specific error.
    pub fn parse(fields: ProductFields<'_>) -> Result<Self, DraftError> {
        let ProductFields {
            name,
            quantity,
            price,
            category_id,
            manufactured_on,
        } = fields;

        if [name, quantity, price, category_id, manufactured_on]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(DraftError::MissingFields);
        }

        let quantity = quantity
            .trim()
            .parse::<i32>()
            .map_err(|_| DraftError::InvalidQuantity)?;

        Self::new(
            name,
            quantity,
            Price::parse(price)?,
            parse_category(category_id)?,
            parse_date(manufactured_on)?,
        )
    }
}

/// Validated changes to an existing product.
///
/// Stock is not editable; it only moves through checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEdit {
    /// New name, trimmed.
    pub name: String,
    /// New unit price.
    pub price: Price,
    /// New owning category.
    pub category_id: CategoryId,
    /// New manufacture date.
    pub manufactured_on: NaiveDate,
}

impl ProductEdit {
    /// Validate raw form input; `fields.quantity` is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`ProductDraft::parse`], minus the quantity checks.
    pub fn parse(fields: ProductFields<'_>) -> Result<Self, DraftError> {
        if [
            fields.name,
            fields.price,
            fields.category_id,
            fields.manufactured_on,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
        {
            return Err(DraftError::MissingFields);
        }

        Ok(Self {
            name: parse_name(fields.name)?,
            price: Price::parse(fields.price)?,
            category_id: parse_category(fields.category_id)?,
            manufactured_on: parse_date(fields.manufactured_on)?,
        })
    }
}

fn parse_name(name: &str) -> Result<String, DraftError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DraftError::MissingFields);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DraftError::NameTooLong {
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_owned())
}

fn parse_category(category_id: &str) -> Result<CategoryId, DraftError> {
    category_id
        .trim()
        .parse::<i32>()
        .map(CategoryId::new)
        .map_err(|_| DraftError::InvalidCategory)
}

fn parse_date(date: &str) -> Result<NaiveDate, DraftError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|_| DraftError::InvalidDate)
}
