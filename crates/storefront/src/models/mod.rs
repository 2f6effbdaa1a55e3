//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the row types each store
//! backend decodes into.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use cart::{CartEntry, CartLine, CartSummary};
pub use catalog::{Category, CategoryWithProducts, Product};
pub use order::{NewOrderLine, OrderEntry, OrderLine, Transaction, TransactionHistory};
pub use session::CurrentUser;
pub use user::{NewUser, ProfileUpdate, User, UserCredentials};
