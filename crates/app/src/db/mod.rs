//! Persistence for platform sessions and catalogs.
//!
//! # Schema: `showroom`
//!
//! ## Tables
//!
//! - `shopify_session` - OAuth sessions (offline per shop, online per user)
//! - `catalog` - Saved catalogs; the product snapshot lives in a JSONB column
//! - `browser_session` - tower-sessions storage for browser sessions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/app/migrations/` and run via:
//! ```bash
//! cargo run -p showroom-cli -- migrate
//! ```
//!
//! Without a database URL the app falls back to the in-memory repositories in
//! [`memory`], which lose everything on restart.

pub mod catalogs;
pub mod memory;
pub mod sessions;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use showroom_core::{Catalog, CatalogId, NewCatalog, ShopDomain};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalogs::PgCatalogRepository;
pub use memory::{InMemoryCatalogRepository, InMemorySessionRepository};
pub use sessions::{PgSessionRepository, ShopifySession};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Storage for Shopify OAuth sessions.
///
/// Absence is `Ok(None)`; a failing store is `Err`, so callers can tell
/// "re-authenticate" apart from "try again later".
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or replace a session by id.
    async fn store(&self, session: &ShopifySession) -> Result<(), RepositoryError>;

    /// Load a session by id.
    async fn load(&self, id: &str) -> Result<Option<ShopifySession>, RepositoryError>;

    /// Delete a session by id. Returns whether a session was removed.
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Delete several sessions at once. Returns how many were removed.
    async fn delete_many(&self, ids: &[String]) -> Result<u64, RepositoryError>;

    /// All sessions (online and offline) belonging to a shop.
    async fn find_by_shop(&self, shop: &ShopDomain) -> Result<Vec<ShopifySession>, RepositoryError>;
}

/// Storage for catalogs.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persist a new catalog, assigning its id and creation time.
    async fn create(&self, catalog: NewCatalog) -> Result<Catalog, RepositoryError>;

    /// The shop's catalogs, newest first.
    async fn list(&self, shop: &ShopDomain) -> Result<Vec<Catalog>, RepositoryError>;

    /// A catalog by id, regardless of shop.
    async fn get(&self, id: CatalogId) -> Result<Option<Catalog>, RepositoryError>;

    /// Delete the shop's catalogs with the given ids as one unit.
    ///
    /// Returns the ids that were actually removed, in request order.
    async fn delete_many(
        &self,
        shop: &ShopDomain,
        ids: &[CatalogId],
    ) -> Result<Vec<CatalogId>, RepositoryError>;
}

/// Repository handles shared by every request.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub catalogs: Arc<dyn CatalogRepository>,
    pool: Option<PgPool>,
}

impl Storage {
    /// `PostgreSQL`-backed storage.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            catalogs: Arc::new(PgCatalogRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Process-local storage for development and tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::default()),
            catalogs: Arc::new(InMemoryCatalogRepository::default()),
            pool: None,
        }
    }

    /// The database pool, when running on `PostgreSQL`.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Check that the backing store answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database cannot be reached.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
