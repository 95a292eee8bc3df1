//! Product and customer shapes exchanged with the admin UI.
//!
//! Both types use camelCase JSON field names and omit absent optional fields,
//! so a catalog's product list serializes back exactly as it was submitted.

use serde::{Deserialize, Serialize};

/// Denormalized copy of a Shopify product taken when a catalog is created.
///
/// Snapshots are never refreshed; the live product may change or disappear
/// without affecting saved catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Shopify product GID (e.g. `gid://shopify/Product/123`).
    pub id: String,
    /// Product title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Display price, e.g. `"1200.00 EUR"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

impl ProductSnapshot {
    /// Create a snapshot with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: None,
            price: None,
            artist: None,
            year: None,
            dimensions: None,
            medium: None,
            frame: None,
        }
    }

    /// Artwork details joined for display (`artist, year, medium`).
    #[must_use]
    pub fn byline(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.artist, &self.year, &self.medium]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Shopify customer as shown in the admin (read-only, never persisted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Shopify customer GID.
    pub id: String,
    /// Primary email address (empty when the customer has none).
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Customer {
    /// Full name, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_snapshot_serializes_without_nulls() {
        let product: ProductSnapshot =
            serde_json::from_str(r#"{"id":"p1","title":"Vase"}"#).unwrap();
        assert_eq!(product, ProductSnapshot::new("p1", "Vase"));
        assert_eq!(
            serde_json::to_string(&product).unwrap(),
            r#"{"id":"p1","title":"Vase"}"#
        );
    }

    #[test]
    fn test_snapshot_camel_case_fields() {
        let mut product = ProductSnapshot::new("p2", "Harbour at Dusk");
        product.image_url = Some("https://cdn.shopify.com/a.jpg".to_string());
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["imageUrl"], "https://cdn.shopify.com/a.jpg");
    }

    #[test]
    fn test_byline() {
        let mut product = ProductSnapshot::new("p3", "Untitled");
        assert_eq!(product.byline(), None);

        product.artist = Some("A. Moreau".to_string());
        product.medium = Some("Oil on canvas".to_string());
        assert_eq!(product.byline().as_deref(), Some("A. Moreau, Oil on canvas"));
    }

    #[test]
    fn test_customer_display_name() {
        let customer = Customer {
            id: "gid://shopify/Customer/1".to_string(),
            email: "ines@example.com".to_string(),
            first_name: Some("Ines".to_string()),
            last_name: None,
        };
        assert_eq!(customer.display_name(), "Ines");

        let anonymous = Customer {
            first_name: None,
            ..customer
        };
        assert_eq!(anonymous.display_name(), "ines@example.com");
    }
}
