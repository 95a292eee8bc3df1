//! Shopify OAuth route handlers.
//!
//! Both the offline and the online flow return to the same callback; the
//! pending flow kept in the browser session says which one it was.

use axum::{
    Router,
    extract::{Query, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::models::session::keys;
use crate::services::auth::CallbackParams;
use crate::services::{OAuthMode, OAuthService, PendingOAuth};
use crate::state::AppState;

use super::{admin_url, found, oauth_url};

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth", get(begin_offline))
        .route("/api/auth/online", get(begin_online))
        .route("/api/auth/callback", get(callback))
        .route("/auth/logout", post(logout))
}

/// Query of the OAuth begin routes.
#[derive(Debug, Deserialize)]
pub struct BeginQuery {
    pub shop: Option<String>,
}

/// Start the offline (shop-wide) OAuth flow.
///
/// GET /api/auth?shop=
async fn begin_offline(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BeginQuery>,
) -> Result<Response, AppError> {
    begin(&state, &session, query.shop.as_deref(), OAuthMode::Offline).await
}

/// Start the online (per staff member) OAuth flow.
///
/// GET /api/auth/online?shop=
async fn begin_online(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BeginQuery>,
) -> Result<Response, AppError> {
    begin(&state, &session, query.shop.as_deref(), OAuthMode::Online).await
}

async fn begin(
    state: &AppState,
    session: &Session,
    shop: Option<&str>,
    mode: OAuthMode,
) -> Result<Response, AppError> {
    let service = OAuthService::new(state.shopify(), state.config());
    let (pending, url) = service.begin(shop, mode)?;

    session.insert(keys::OAUTH_PENDING, &pending).await?;

    Ok(found(&url))
}

/// Finish either OAuth flow.
///
/// GET /api/auth/callback?code=&shop=&state=&host=&hmac=&timestamp=
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    // Single use, even when the callback is rejected
    let pending: Option<PendingOAuth> = session.remove(keys::OAUTH_PENDING).await?;

    let service = OAuthService::new(state.shopify(), state.config());
    let shopify_session = service
        .complete(raw_query.as_deref().unwrap_or_default(), &params, pending, Utc::now())
        .await?;

    state.sessions().store(&shopify_session).await?;

    let shop = shopify_session.shop.clone();
    session.cycle_id().await?;
    session.insert(keys::SHOP, &shop).await?;
    if let Some(host) = params.host.as_deref() {
        session.insert(keys::HOST, host).await?;
    }

    let target = if shopify_session.is_online {
        session
            .insert(keys::ONLINE_SESSION_ID, &shopify_session.id)
            .await?;
        admin_url(&shop, params.host.as_deref())
    } else if state.config().shopify.use_online_tokens {
        oauth_url(&shop, true)
    } else {
        admin_url(&shop, params.host.as_deref())
    };

    Ok(found(&target))
}

/// Drop the browser's online session and clear the browser session.
///
/// POST /auth/logout
async fn logout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    if let Some(id) = session.get::<String>(keys::ONLINE_SESSION_ID).await? {
        state.sessions().delete(&id).await?;
        tracing::info!(session_id = %id, "Online Shopify session deleted");
    }

    session.flush().await?;

    Ok(Redirect::to("/").into_response())
}
