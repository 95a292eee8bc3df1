//! CLI subcommands.

pub mod migrate;
pub mod sessions;

use secrecy::SecretString;
use sqlx::PgPool;

/// Errors shared by the database-backed commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(#[from] showroom_app::db::RepositoryError),

    /// Invalid shop domain.
    #[error("{0}")]
    InvalidShop(#[from] showroom_core::ShopDomainError),
}

/// Connect to the database named by `SHOWROOM_DATABASE_URL` (or `DATABASE_URL`).
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SHOWROOM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SHOWROOM_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(showroom_app::db::create_pool(&database_url).await?)
}
