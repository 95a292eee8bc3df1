//! Catalog representation returned to clients.

use chrono::{DateTime, Utc};
use serde::Serialize;
use showroom_core::{Catalog, CatalogId, ProductSnapshot};

/// A catalog as the API and templates see it.
///
/// Never carries the password or its hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub id: CatalogId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_text: Option<String>,
    pub products: Vec<ProductSnapshot>,
    pub is_protected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Catalog> for CatalogView {
    fn from(catalog: Catalog) -> Self {
        Self {
            is_protected: catalog.is_protected(),
            id: catalog.id,
            title: catalog.title,
            lead_text: catalog.lead_text,
            products: catalog.products,
            username: catalog.username,
            expires_at: catalog.expires_at,
            created_at: catalog.created_at,
        }
    }
}

impl CatalogView {
    /// Public form for preview visitors: credentials stay server-side.
    #[must_use]
    pub fn public(catalog: Catalog) -> Self {
        Self {
            username: None,
            ..Self::from(catalog)
        }
    }
}
