//! Shopify session management.
//!
//! Revoking a shop's sessions forces the next app launch through OAuth,
//! which is the way to pick up changed access scopes.

use chrono::Utc;
use showroom_app::db::{PgSessionRepository, SessionRepository, ShopifySession};
use showroom_core::ShopDomain;

use super::{CommandError, connect};

/// One line per stored session of `shop`. Access tokens are never printed.
///
/// # Errors
///
/// Returns `CommandError` if the shop is invalid or the database fails.
pub async fn list(shop: &str) -> Result<Vec<String>, CommandError> {
    let shop = ShopDomain::parse(shop)?;
    let repo = PgSessionRepository::new(connect().await?);

    let sessions = repo.find_by_shop(&shop).await?;
    if sessions.is_empty() {
        tracing::info!(shop = %shop, "No stored sessions");
    }
    Ok(sessions.iter().map(describe).collect())
}

fn describe(session: &ShopifySession) -> String {
    let kind = if session.is_online { "online" } else { "offline" };
    let status = if session.is_active(Utc::now()) { "active" } else { "expired" };
    let expires = session
        .expires
        .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
    format!(
        "{}\t{kind}\t{status}\texpires={expires}\tscope={}",
        session.id, session.scope
    )
}

/// Delete every stored session of `shop`. Returns how many were deleted.
///
/// # Errors
///
/// Returns `CommandError` if the shop is invalid or the database fails.
pub async fn revoke(shop: &str) -> Result<u64, CommandError> {
    let shop = ShopDomain::parse(shop)?;
    let repo = PgSessionRepository::new(connect().await?);

    let ids: Vec<String> = repo
        .find_by_shop(&shop)
        .await?
        .into_iter()
        .map(|session| session.id)
        .collect();

    if ids.is_empty() {
        tracing::info!(shop = %shop, "No stored sessions");
        return Ok(0);
    }

    Ok(repo.delete_many(&ids).await?)
}
