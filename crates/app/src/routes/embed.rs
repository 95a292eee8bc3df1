//! App launch and the iframe-escape handshake.
//!
//! Shopify opens the app at `/` inside the admin iframe with a signed query.
//! OAuth has to run in the top window, so an embedded launch without a
//! stored session first leaves the iframe through `/exitiframe`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, RawQuery, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use showroom_core::ShopDomain;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ShopifySession;
use crate::db::sessions::load_active;
use crate::error::AppError;
use crate::models::session::keys;
use crate::services::OAuthService;
use crate::services::auth::{AuthError, verify_query_hmac};
use crate::state::AppState;

use super::{admin_url, exit_iframe_url, found, oauth_url};

/// Build the embedding router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(launch))
        .route("/exitiframe", get(exit_iframe))
}

/// Query Shopify sends when opening the app.
#[derive(Debug, Default, Deserialize)]
pub struct LaunchQuery {
    pub shop: Option<String>,
    pub host: Option<String>,
    pub hmac: Option<String>,
    pub embedded: Option<String>,
}

/// Query of the iframe-escape page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitIframeQuery {
    pub redirect_uri: Option<String>,
}

/// Page that sends the top window to `redirect_uri`.
#[derive(Template, WebTemplate)]
#[template(path = "exitiframe.html")]
pub struct ExitIframeTemplate {
    pub redirect_uri: String,
}

/// App entry point.
///
/// GET /?shop=&host=&hmac=&timestamp=&embedded=
#[instrument(skip_all)]
async fn launch(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<LaunchQuery>,
) -> Result<Response, AppError> {
    let Some(shop_param) = query.shop.as_deref() else {
        // Direct visit: continue with the shop this browser already launched
        return match session.get::<ShopDomain>(keys::SHOP).await? {
            Some(shop) => {
                let host: Option<String> = session.get(keys::HOST).await?;
                Ok(found(&admin_url(&shop, host.as_deref())))
            }
            None => Err(AuthError::MissingParameter("shop").into()),
        };
    };

    let signed = query.hmac.is_some();
    if signed
        && !verify_query_hmac(
            raw_query.as_deref().unwrap_or_default(),
            state.config().shopify.secret_bytes(),
        )
    {
        tracing::warn!("App launch signature mismatch");
        return Err(AuthError::InvalidHmac.into());
    }

    let shop = OAuthService::new(state.shopify(), state.config()).resolve_shop(Some(shop_param))?;

    let offline = load_active(state.sessions(), &ShopifySession::offline_id(&shop), Utc::now()).await?;
    if offline.is_none() {
        tracing::info!(shop = %shop, "No offline session, starting OAuth");
        let begin = oauth_url(&shop, false);
        return Ok(if query.embedded.as_deref() == Some("1") {
            found(&exit_iframe_url(&begin))
        } else {
            found(&begin)
        });
    }

    // Only a request signed by Shopify may establish the shop
    if signed {
        session.insert(keys::SHOP, &shop).await?;
        if let Some(host) = query.host.as_deref() {
            session.insert(keys::HOST, host).await?;
        }
    }

    Ok(found(&admin_url(&shop, query.host.as_deref())))
}

/// Render the iframe-escape page.
///
/// GET /exitiframe?redirectUri=
async fn exit_iframe(Query(query): Query<ExitIframeQuery>) -> Result<Response, AppError> {
    let redirect_uri = query
        .redirect_uri
        .filter(|uri| is_app_path(uri))
        .ok_or_else(|| AppError::Validation("redirectUri must be a path within the app".to_string()))?;

    Ok(ExitIframeTemplate { redirect_uri }.into_response())
}

const APP_ORIGIN: &str = "https://app.invalid";

/// Whether `uri` is a path on this app rather than another origin.
///
/// Browsers drop tabs and newlines while parsing, so `/\t/host` would
/// become `//host`; control characters and whitespace are refused outright
/// and the joined URL must keep the placeholder host.
fn is_app_path(uri: &str) -> bool {
    if !uri.starts_with('/')
        || uri.starts_with("//")
        || uri.contains('\\')
        || uri.chars().any(|c| c.is_ascii_control() || c.is_whitespace())
    {
        return false;
    }

    url::Url::parse(APP_ORIGIN)
        .and_then(|base| base.join(uri))
        .is_ok_and(|joined| joined.origin().ascii_serialization() == APP_ORIGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_app_path() {
        assert!(is_app_path("/api/auth?shop=gallery.myshopify.com"));
        assert!(is_app_path("/admin"));
        assert!(!is_app_path("https://evil.example"));
        assert!(!is_app_path("//evil.example"));
        assert!(!is_app_path("/\\evil.example"));
        assert!(!is_app_path("javascript:alert(1)"));
        assert!(!is_app_path("admin"));
        assert!(!is_app_path("/\t/evil.example.com"));
        assert!(!is_app_path("/\n/evil.example.com"));
        assert!(!is_app_path("/\r//evil.example.com"));
        assert!(!is_app_path("/ /evil.example.com"));
    }
}
