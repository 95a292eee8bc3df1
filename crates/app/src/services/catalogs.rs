//! Catalog creation, listing and bulk deletion.
//!
//! Preview passwords are hashed with Argon2id before they reach the
//! repository; the plain password is dropped right after hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use showroom_core::{Catalog, CatalogId, NewCatalog, ProductSnapshot, ShopDomain};
use thiserror::Error;

use crate::db::{CatalogRepository, RepositoryError};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Request fields are missing or inconsistent.
    #[error("{0}")]
    Validation(String),

    /// The catalog does not exist or belongs to another shop.
    #[error("catalog not found")]
    NotFound,

    /// Argon2 failed to hash the preview password.
    #[error("failed to hash preview password")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog creation input, as posted by the admin UI.
///
/// Every field is optional at the wire level so missing fields surface as
/// validation errors rather than decoding failures.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDraft {
    pub title: Option<String>,
    pub products: Option<Vec<ProductSnapshot>>,
    pub lead_text: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Catalog operations for one repository.
pub struct CatalogService<'a> {
    catalogs: &'a dyn CatalogRepository,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(catalogs: &'a dyn CatalogRepository) -> Self {
        Self { catalogs }
    }

    /// Validate a draft and store it for `shop`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the title is blank, products are
    /// absent, or only one of username and password is given.
    #[tracing::instrument(skip(self, draft), fields(shop = %shop))]
    pub async fn create(&self, shop: &ShopDomain, draft: CatalogDraft) -> Result<Catalog, CatalogError> {
        let new = prepare(shop, draft)?;
        let catalog = self.catalogs.create(new).await?;

        tracing::info!(
            catalog_id = %catalog.id,
            products = catalog.products.len(),
            protected = catalog.is_protected(),
            "Catalog created"
        );

        Ok(catalog)
    }

    /// The shop's catalogs, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn list(&self, shop: &ShopDomain) -> Result<Vec<Catalog>, CatalogError> {
        Ok(self.catalogs.list(shop).await?)
    }

    /// A catalog owned by `shop`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids, malformed ids and
    /// catalogs of other shops.
    pub async fn get(&self, shop: &ShopDomain, id: &str) -> Result<Catalog, CatalogError> {
        let id = CatalogId::parse(id).map_err(|_| CatalogError::NotFound)?;
        match self.catalogs.get(id).await? {
            Some(catalog) if &catalog.shop == shop => Ok(catalog),
            _ => Err(CatalogError::NotFound),
        }
    }

    /// Delete the shop's catalogs with the given ids.
    ///
    /// Ids that do not parse cannot exist and are skipped. Returns the ids
    /// removed, in request order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if `ids` is empty.
    #[tracing::instrument(skip(self, ids), fields(shop = %shop, requested = ids.len()))]
    pub async fn delete_many(
        &self,
        shop: &ShopDomain,
        ids: &[String],
    ) -> Result<Vec<CatalogId>, CatalogError> {
        if ids.is_empty() {
            return Err(CatalogError::Validation("ids is required".to_string()));
        }

        let parsed: Vec<CatalogId> = ids
            .iter()
            .filter_map(|id| CatalogId::parse(id).ok())
            .collect();

        let deleted = self.catalogs.delete_many(shop, &parsed).await?;
        tracing::info!(deleted = deleted.len(), "Catalogs deleted");

        Ok(deleted)
    }
}

/// Turn a draft into a storable catalog, hashing the password.
fn prepare(shop: &ShopDomain, draft: CatalogDraft) -> Result<NewCatalog, CatalogError> {
    let title = draft
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CatalogError::Validation("title is required".to_string()))?;
    let products = draft
        .products
        .ok_or_else(|| CatalogError::Validation("products is required".to_string()))?;

    let username = draft.username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
    let password = draft.password.filter(|p| !p.is_empty());

    let credentials = match (username, password) {
        (Some(username), Some(password)) => Some((username, hash_password(&password)?)),
        (None, None) => None,
        _ => {
            return Err(CatalogError::Validation(
                "username and password must be set together".to_string(),
            ));
        }
    };

    Ok(NewCatalog {
        shop: shop.clone(),
        title,
        lead_text: draft.lead_text.filter(|t| !t.trim().is_empty()),
        products,
        credentials,
        expires_at: draft.expires_at,
    })
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, CatalogError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CatalogError::PasswordHash)
}
