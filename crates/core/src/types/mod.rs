//! Core types for Stockroom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod access;
pub mod id;
pub mod price;
pub mod username;

pub use access::{AccessDenied, AccessLevel, Requirement};
pub use id::*;
pub use price::{Price, PriceError};
pub use username::{Username, UsernameError};
