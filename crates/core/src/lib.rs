//! Stockroom Core - domain types and pure business rules.
//!
//! This crate is shared by every Stockroom component:
//! - `storefront` - The web application (customers and admins)
//! - `cli` - Command-line tools for migrations, admin accounts and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything here can be tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, usernames and access levels
//! - [`catalog`] - Validation of category names and product drafts
//! - [`checkout`] - The checkout plan: price snapshots, stock demand, totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod types;

pub use types::*;
