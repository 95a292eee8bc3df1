//! View models and browser-session types.

pub mod catalog;
pub mod session;

pub use catalog::CatalogView;
