//! Catalog records and the preview access decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::CatalogId;
use super::product::ProductSnapshot;
use super::shop::ShopDomain;

/// A saved catalog: a curated product snapshot plus presentation metadata.
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// server, so API and page views build their own representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub id: CatalogId,
    /// Shop that owns the catalog.
    pub shop: ShopDomain,
    pub title: String,
    /// Optional introduction shown above the products.
    pub lead_text: Option<String>,
    pub products: Vec<ProductSnapshot>,
    /// Preview username (set together with `password_hash`).
    pub username: Option<String>,
    /// Argon2 PHC string of the preview password.
    pub password_hash: Option<String>,
    /// After this instant the preview is permanently unavailable.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a catalog.
///
/// Credentials arrive already hashed; hashing happens in the service layer.
#[derive(Debug, Clone)]
pub struct NewCatalog {
    pub shop: ShopDomain,
    pub title: String,
    pub lead_text: Option<String>,
    pub products: Vec<ProductSnapshot>,
    /// `(username, password_hash)` when the preview is gated.
    pub credentials: Option<(String, String)>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of evaluating a preview request against a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewAccess {
    /// The catalog expired; nothing but the expiry notice may be shown.
    Expired,
    /// The catalog is protected and this browser has not unlocked it.
    Locked,
    /// Products may be rendered.
    Unlocked,
}

impl Catalog {
    /// Whether the preview requires a username/password pair.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        self.username.is_some() && self.password_hash.is_some()
    }

    /// Whether the catalog's expiry lies in the past relative to `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Decide what a preview visitor may see.
    ///
    /// Expiry wins over everything, including a previous unlock. A public
    /// catalog is always unlocked; a protected one only when `unlocked` is set
    /// for this browser session.
    #[must_use]
    pub fn preview_access(&self, now: DateTime<Utc>, unlocked: bool) -> PreviewAccess {
        if self.is_expired(now) {
            PreviewAccess::Expired
        } else if !self.is_protected() || unlocked {
            PreviewAccess::Unlocked
        } else {
            PreviewAccess::Locked
        }
    }
}

impl NewCatalog {
    /// Materialize the record with its generated id and creation time.
    #[must_use]
    pub fn into_catalog(self, id: CatalogId, created_at: DateTime<Utc>) -> Catalog {
        let (username, password_hash) = match self.credentials {
            Some((username, hash)) => (Some(username), Some(hash)),
            None => (None, None),
        };

        Catalog {
            id,
            shop: self.shop,
            title: self.title,
            lead_text: self.lead_text,
            products: self.products,
            username,
            password_hash,
            expires_at: self.expires_at,
            created_at,
        }
    }
}
