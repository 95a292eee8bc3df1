//! Core types for Showroom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod id;
pub mod product;
pub mod shop;

pub use catalog::{Catalog, NewCatalog, PreviewAccess};
pub use id::{CatalogId, CatalogIdError};
pub use product::{Customer, ProductSnapshot};
pub use shop::{ShopDomain, ShopDomainError};
