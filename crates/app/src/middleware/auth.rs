//! Extractor resolving the shop a request acts for.
//!
//! Embedded API calls authenticate with an App Bridge session token
//! (`Authorization: Bearer <jwt>`). Otherwise the shop recorded in the
//! browser session by a verified launch or OAuth callback is used.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use showroom_core::ShopDomain;
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_shop};
use crate::models::session::keys;
use crate::services::auth::{AuthError, verify_session_token};
use crate::state::AppState;

/// Extractor that requires a resolvable shop.
///
/// Rejects with 401 when neither a valid session token nor a browser
/// session names a shop.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireShop(shop): RequireShop) -> impl IntoResponse {
///     format!("Hello, {shop}!")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireShop(pub ShopDomain);

impl FromRequestParts<AppState> for RequireShop {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let shop = if let Some(header) = parts.headers.get(AUTHORIZATION) {
            let token = header
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or_else(|| {
                    AuthError::InvalidSessionToken("malformed authorization header".to_string())
                })?;

            let shopify = &state.config().shopify;
            let (shop, _claims) =
                verify_session_token(token.trim(), &shopify.api_key, shopify.secret_bytes())?;
            shop
        } else {
            let session = parts.extensions.get::<Session>().cloned();
            let shop = match session {
                Some(session) => session.get::<ShopDomain>(keys::SHOP).await?,
                None => None,
            };
            shop.ok_or_else(|| {
                AppError::Unauthorized("no shop session, open the app from Shopify admin".to_string())
            })?
        };

        if shop != state.config().shopify.store {
            return Err(AppError::Unauthorized(format!("shop {shop} is not installed")));
        }

        set_sentry_shop(shop.as_str());
        Ok(Self(shop))
    }
}
