//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, profile edits and the bootstrap admin
//! - `catalog` - Categories and products
//! - `cart` - Per-user cart lines
//! - `checkout` - Atomic cart → transaction conversion
//! - `orders` - Order history
//!
//! Each service borrows a [`Store`](crate::db::Store) and opens its own units
//! of work, so handlers and the CLI construct them on demand.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
