//! Shopify OAuth session records and their `PostgreSQL` repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use showroom_core::ShopDomain;
use sqlx::PgPool;

use super::{RepositoryError, SessionRepository};

// =============================================================================
// Types
// =============================================================================

/// A Shopify OAuth session.
///
/// Offline sessions belong to the shop and never expire; online sessions
/// belong to one staff member inside the Shopify admin and carry `expires`.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifySession {
    /// `offline_<shop>` or `<shop>_<user id>`.
    pub id: String,
    pub shop: ShopDomain,
    /// OAuth `state` the session was created with.
    pub state: String,
    pub is_online: bool,
    /// Comma separated granted scopes.
    pub scope: String,
    /// OAuth access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
    pub expires: Option<DateTime<Utc>>,
    /// Shopify staff member id for online sessions.
    pub associated_user_id: Option<i64>,
}

impl std::fmt::Debug for ShopifySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifySession")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("is_online", &self.is_online)
            .field("scope", &self.scope)
            .field("access_token", &"[REDACTED]")
            .field("expires", &self.expires)
            .field("associated_user_id", &self.associated_user_id)
            .finish()
    }
}

impl ShopifySession {
    /// Session id of the shop's offline session.
    #[must_use]
    pub fn offline_id(shop: &ShopDomain) -> String {
        format!("offline_{shop}")
    }

    /// Session id of a staff member's online session.
    #[must_use]
    pub fn online_id(shop: &ShopDomain, user_id: i64) -> String {
        format!("{shop}_{user_id}")
    }

    /// Whether the session can still be used for API calls.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.expose_secret().is_empty()
            && self.expires.is_none_or(|expires| expires > now)
    }
}

/// Load a session and discard it if it is no longer usable.
///
/// Expired sessions are deleted so later lookups do not see them again.
///
/// # Errors
///
/// Returns `RepositoryError` if the store fails.
pub async fn load_active(
    repo: &dyn SessionRepository,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Option<ShopifySession>, RepositoryError> {
    let Some(session) = repo.load(id).await? else {
        return Ok(None);
    };

    if session.is_active(now) {
        return Ok(Some(session));
    }

    tracing::info!(session_id = %id, "Discarding expired Shopify session");
    repo.delete(id).await?;
    Ok(None)
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    shop: String,
    state: String,
    is_online: bool,
    scope: String,
    access_token: String,
    expires: Option<DateTime<Utc>>,
    associated_user_id: Option<i64>,
}

impl TryFrom<SessionRow> for ShopifySession {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop)
            .map_err(|e| RepositoryError::DataCorruption(format!("session {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            shop,
            state: row.state,
            is_online: row.is_online,
            scope: row.scope,
            access_token: SecretString::from(row.access_token),
            expires: row.expires,
            associated_user_id: row.associated_user_id,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` session repository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn store(&self, session: &ShopifySession) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO showroom.shopify_session
                (id, shop, state, is_online, scope, access_token, expires, associated_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                shop = EXCLUDED.shop,
                state = EXCLUDED.state,
                is_online = EXCLUDED.is_online,
                scope = EXCLUDED.scope,
                access_token = EXCLUDED.access_token,
                expires = EXCLUDED.expires,
                associated_user_id = EXCLUDED.associated_user_id,
                updated_at = now()
            ",
        )
        .bind(&session.id)
        .bind(session.shop.as_str())
        .bind(&session.state)
        .bind(session.is_online)
        .bind(&session.scope)
        .bind(session.access_token.expose_secret())
        .bind(session.expires)
        .bind(session.associated_user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<ShopifySession>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT id, shop, state, is_online, scope, access_token, expires, associated_user_id
            FROM showroom.shopify_session
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ShopifySession::try_from).transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM showroom.shopify_session WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: &[String]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM showroom.shopify_session WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_shop(&self, shop: &ShopDomain) -> Result<Vec<ShopifySession>, RepositoryError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT id, shop, state, is_online, scope, access_token, expires, associated_user_id
            FROM showroom.shopify_session
            WHERE shop = $1
            ORDER BY id
            ",
        )
        .bind(shop.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ShopifySession::try_from).collect()
    }
}
