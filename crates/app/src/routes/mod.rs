//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Embedding
//! GET  /                           - App launch from the Shopify admin
//! GET  /exitiframe                 - Break out of the admin iframe
//!
//! # Shopify OAuth
//! GET  /api/auth                   - Start offline OAuth
//! GET  /api/auth/online            - Start online OAuth
//! GET  /api/auth/callback          - OAuth callback (both variants)
//! POST /auth/logout                - Drop the browser's online session
//!
//! # Admin API (requires shop)
//! GET  /api/products               - First 10 products
//! GET  /api/customers              - First 10 customers
//! POST /api/catalogs               - Create catalog
//! GET  /api/catalogs/list          - Shop's catalogs, newest first
//! GET  /api/catalogs/get?id=       - One catalog
//! POST /api/catalogs/delete        - Bulk delete
//!
//! # Admin pages (requires shop)
//! GET  /admin                      - Dashboard
//! GET  /admin/catalogs/new         - Catalog form
//! POST /admin/catalogs             - Create catalog from form
//! POST /admin/catalogs/delete      - Bulk delete from form
//!
//! # Public preview
//! GET  /preview/{id}               - Catalog page or credential form
//! POST /preview/{id}/unlock        - Submit credentials
//! GET  /api/preview/{id}           - JSON preview state
//! POST /api/preview/{id}/unlock    - JSON unlock
//!
//! # Webhooks
//! POST /api/webhooks/app-uninstalled - Delete the shop's sessions
//! ```

pub mod admin;
pub mod auth;
pub mod catalogs;
pub mod customers;
pub mod embed;
pub mod preview;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use showroom_core::ShopDomain;
use tower_sessions::Session;

use crate::db::ShopifySession;
use crate::error::AppError;
use crate::models::session::keys;
use crate::state::AppState;

/// Number of products/customers fetched from Shopify per request.
pub const PAGE_SIZE: i64 = 10;

/// Build the router with every route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(embed::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(customers::router())
        .merge(catalogs::router())
        .merge(admin::router())
        .merge(preview::router())
        .merge(webhooks::router())
}

/// Load the Shopify session used to call the Admin API for `shop`.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when the shop has no active session.
pub(crate) async fn shopify_session(
    state: &AppState,
    session: &Session,
    shop: &ShopDomain,
) -> Result<ShopifySession, AppError> {
    let online_id: Option<String> = session.get(keys::ONLINE_SESSION_ID).await?;

    state
        .api_session(shop, online_id.as_deref())
        .await?
        .ok_or_else(|| AppError::Unauthorized(format!("no active Shopify session for {shop}")))
}

/// A `302 Found` redirect.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Embedded admin entry point, keeping `shop` and `host`.
pub(crate) fn admin_url(shop: &ShopDomain, host: Option<&str>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("shop", shop.as_str());
    if let Some(host) = host {
        query.append_pair("host", host);
    }
    format!("/admin?{}", query.finish())
}

/// Start of the OAuth flow for `shop`.
pub(crate) fn oauth_url(shop: &ShopDomain, online: bool) -> String {
    let path = if online { "/api/auth/online" } else { "/api/auth" };
    format!("{path}?shop={}", urlencoding::encode(shop.as_str()))
}

/// Page that navigates the top window to `target`.
pub(crate) fn exit_iframe_url(target: &str) -> String {
    format!("/exitiframe?redirectUri={}", urlencoding::encode(target))
}
