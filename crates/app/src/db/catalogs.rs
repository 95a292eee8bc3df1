//! Catalog repository for `PostgreSQL`.
//!
//! Products are stored as a JSONB array so a catalog stays a single document
//! and reads back exactly as it was written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use showroom_core::{Catalog, CatalogId, NewCatalog, ProductSnapshot, ShopDomain};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{CatalogRepository, RepositoryError};

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    id: Uuid,
    shop: String,
    title: String,
    lead_text: Option<String>,
    products: Json<Vec<ProductSnapshot>>,
    username: Option<String>,
    password_hash: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CatalogRow> for Catalog {
    type Error = RepositoryError;

    fn try_from(row: CatalogRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop)
            .map_err(|e| RepositoryError::DataCorruption(format!("catalog {}: {e}", row.id)))?;

        Ok(Self {
            id: CatalogId::from_uuid(row.id),
            shop,
            title: row.title,
            lead_text: row.lead_text,
            products: row.products.0,
            username: row.username,
            password_hash: row.password_hash,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, shop, title, lead_text, products, username, password_hash, expires_at, created_at";

/// `PostgreSQL` catalog repository.
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn create(&self, catalog: NewCatalog) -> Result<Catalog, RepositoryError> {
        let catalog = catalog.into_catalog(CatalogId::generate(), Utc::now());

        sqlx::query(
            r"
            INSERT INTO showroom.catalog
                (id, shop, title, lead_text, products, username, password_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(catalog.id.as_uuid())
        .bind(catalog.shop.as_str())
        .bind(&catalog.title)
        .bind(&catalog.lead_text)
        .bind(Json(&catalog.products))
        .bind(&catalog.username)
        .bind(&catalog.password_hash)
        .bind(catalog.expires_at)
        .bind(catalog.created_at)
        .execute(&self.pool)
        .await?;

        Ok(catalog)
    }

    async fn list(&self, shop: &ShopDomain) -> Result<Vec<Catalog>, RepositoryError> {
        let rows = sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM showroom.catalog WHERE shop = $1 \
             ORDER BY created_at DESC, position DESC"
        ))
        .bind(shop.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Catalog::try_from).collect()
    }

    async fn get(&self, id: CatalogId) -> Result<Option<Catalog>, RepositoryError> {
        let row = sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM showroom.catalog WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Catalog::try_from).transpose()
    }

    async fn delete_many(
        &self,
        shop: &ShopDomain,
        ids: &[CatalogId],
    ) -> Result<Vec<CatalogId>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();

        let mut tx = self.pool.begin().await?;
        let removed: Vec<Uuid> = sqlx::query_scalar(
            "DELETE FROM showroom.catalog WHERE shop = $1 AND id = ANY($2) RETURNING id",
        )
        .bind(shop.as_str())
        .bind(&uuids)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(in_request_order(ids, &removed))
    }
}

/// Keep the ids that were removed, in the order they were requested.
pub(crate) fn in_request_order(requested: &[CatalogId], removed: &[Uuid]) -> Vec<CatalogId> {
    let mut seen = Vec::with_capacity(removed.len());
    for id in requested {
        if removed.contains(&id.as_uuid()) && !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_request_order() {
        let a = CatalogId::generate();
        let b = CatalogId::generate();
        let c = CatalogId::generate();

        let removed = vec![c.as_uuid(), a.as_uuid()];
        assert_eq!(in_request_order(&[a, b, c, a], &removed), vec![a, c]);
        assert!(in_request_order(&[b], &removed).is_empty());
    }
}
