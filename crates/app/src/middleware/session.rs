//! Browser session configuration.
//!
//! Sessions live in `PostgreSQL` (`showroom.browser_session`) when a
//! database is configured, in memory otherwise. The app is framed by the
//! Shopify admin, so over HTTPS the cookie is `SameSite=None; Secure`.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "showroom_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Invalid table or schema name for the session store.
#[derive(Debug, thiserror::Error)]
#[error("invalid session store identifier: {0}")]
pub struct SessionStoreError(String);

/// Create the `PostgreSQL` session store in the `showroom` schema.
///
/// # Errors
///
/// Returns `SessionStoreError` if the schema or table name is rejected.
pub fn postgres_store(pool: &PgPool) -> Result<PostgresStore, SessionStoreError> {
    PostgresStore::new(pool.clone())
        .with_schema_name("showroom")
        .map_err(|e| SessionStoreError(e.to_string()))?
        .with_table_name("browser_session")
        .map_err(|e| SessionStoreError(e.to_string()))
}

/// Create the session layer over any store.
#[must_use]
pub fn create_session_layer<S>(store: S, config: &AppConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    let is_secure = config.is_secure();

    // Embedded pages are third-party context: SameSite=None needs Secure
    let same_site = if is_secure {
        tower_sessions::cookie::SameSite::None
    } else {
        tower_sessions::cookie::SameSite::Lax
    };

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(same_site)
        .with_http_only(true)
        .with_path("/")
}
