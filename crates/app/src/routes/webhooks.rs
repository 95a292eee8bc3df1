//! Shopify webhook handlers.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use showroom_core::ShopDomain;
use tracing::instrument;

use crate::error::AppError;
use crate::services::auth::{AuthError, verify_webhook_hmac};
use crate::state::AppState;

/// Signature of the raw body, base64 HMAC-SHA256.
const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

/// Shop the webhook is about.
const SHOP_HEADER: &str = "X-Shopify-Shop-Domain";

/// Build the webhooks router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/webhooks/app-uninstalled", post(app_uninstalled))
}

/// Forget every stored session of a shop that uninstalled the app.
///
/// POST /api/webhooks/app-uninstalled
#[instrument(skip_all)]
async fn app_uninstalled(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(HMAC_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::InvalidWebhook)?;

    if !verify_webhook_hmac(&body, signature, state.config().shopify.secret_bytes()) {
        tracing::warn!("Webhook signature mismatch");
        return Err(AuthError::InvalidWebhook.into());
    }

    let shop = headers
        .get(SHOP_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingParameter(SHOP_HEADER))?;
    let shop = ShopDomain::parse(shop).map_err(AuthError::from)?;

    let ids: Vec<String> = state
        .sessions()
        .find_by_shop(&shop)
        .await?
        .into_iter()
        .map(|session| session.id)
        .collect();
    let deleted = state.sessions().delete_many(&ids).await?;

    tracing::info!(shop = %shop, deleted, "App uninstalled, sessions deleted");

    Ok(StatusCode::OK)
}
