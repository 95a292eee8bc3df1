//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Shopify OAuth, request signatures and session tokens
//! - `catalogs` - Catalog validation, password hashing and bulk delete
//! - `preview` - Public preview gate with per-catalog attempt limits

pub mod auth;
pub mod catalogs;
pub mod preview;

pub use auth::{AuthError, OAuthMode, OAuthService, PendingOAuth};
pub use catalogs::{CatalogDraft, CatalogError, CatalogService};
pub use preview::{PreviewGate, UnlockError};
