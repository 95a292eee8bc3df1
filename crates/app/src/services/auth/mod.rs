//! Shopify authentication service.
//!
//! Covers the OAuth authorization-code flow (offline and online variants),
//! request signatures and App Bridge session tokens.
//!
//! # OAuth flow
//!
//! 1. [`OAuthService::begin`] validates the shop and returns the Shopify
//!    consent URL plus a [`PendingOAuth`] the caller stores in the browser
//!    session.
//! 2. Shopify redirects to the single callback route; [`OAuthService::complete`]
//!    checks the `hmac` signature and the pending `state`, then exchanges the
//!    code for an access token.
//! 3. The caller persists the returned session before redirecting onward.

mod error;
mod hmac;
mod session_token;

pub use error::AuthError;
pub use hmac::{query_signature, verify_query_hmac, verify_webhook_hmac, webhook_signature};
pub use session_token::{SessionTokenClaims, verify_session_token};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showroom_core::ShopDomain;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::ShopifySession;
use crate::shopify::ShopifyClient;

/// Which kind of access token an OAuth flow requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthMode {
    /// Shop-wide token that does not expire.
    Offline,
    /// Token bound to one staff member, expiring with their admin session.
    Online,
}

/// An OAuth flow waiting for its callback, kept in the browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOAuth {
    pub state: String,
    pub mode: OAuthMode,
    pub shop: ShopDomain,
}

/// Query parameters of the OAuth callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub shop: Option<String>,
    pub state: Option<String>,
    pub host: Option<String>,
    pub hmac: Option<String>,
    pub timestamp: Option<String>,
}

/// OAuth begin/callback logic.
pub struct OAuthService<'a> {
    client: &'a ShopifyClient,
    config: &'a AppConfig,
}

impl<'a> OAuthService<'a> {
    /// Create a new OAuth service.
    #[must_use]
    pub const fn new(client: &'a ShopifyClient, config: &'a AppConfig) -> Self {
        Self { client, config }
    }

    /// Validate a `shop` parameter and check it may use the app.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingParameter` when absent, `AuthError::InvalidShop`
    /// when malformed and `AuthError::ShopNotAllowed` for any other store.
    pub fn resolve_shop(&self, shop: Option<&str>) -> Result<ShopDomain, AuthError> {
        let raw = shop
            .filter(|s| !s.trim().is_empty())
            .ok_or(AuthError::MissingParameter("shop"))?;
        let shop = ShopDomain::parse(raw)?;

        if shop != self.config.shopify.store {
            return Err(AuthError::ShopNotAllowed(shop.into_inner()));
        }

        Ok(shop)
    }

    /// Start an OAuth flow.
    ///
    /// Returns the pending flow to store in the browser session and the URL
    /// to redirect the browser to.
    ///
    /// # Errors
    ///
    /// Returns an error if the shop parameter is missing, invalid or not allowed.
    pub fn begin(
        &self,
        shop: Option<&str>,
        mode: OAuthMode,
    ) -> Result<(PendingOAuth, String), AuthError> {
        let shop = self.resolve_shop(shop)?;
        let state = Uuid::new_v4().simple().to_string();

        let url = self.client.authorization_url(
            &shop,
            &self.config.oauth_callback_url(),
            &state,
            mode == OAuthMode::Online,
        );

        tracing::info!(shop = %shop, ?mode, "Starting Shopify OAuth flow");

        Ok((PendingOAuth { state, mode, shop }, url))
    }

    /// Finish an OAuth flow and return the session to persist.
    ///
    /// `raw_query` is the callback's untouched query string, used for the
    /// signature check.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidHmac` for a bad signature, `AuthError::InvalidState`
    /// when the state or shop differ from the pending flow, and
    /// `AuthError::TokenExchange` when Shopify rejects the code.
    pub async fn complete(
        &self,
        raw_query: &str,
        params: &CallbackParams,
        pending: Option<PendingOAuth>,
        now: DateTime<Utc>,
    ) -> Result<ShopifySession, AuthError> {
        if !verify_query_hmac(raw_query, self.config.shopify.secret_bytes()) {
            tracing::warn!("OAuth callback signature mismatch");
            return Err(AuthError::InvalidHmac);
        }

        let shop = self.resolve_shop(params.shop.as_deref())?;

        let pending = pending.ok_or(AuthError::InvalidState)?;
        let state = params.state.as_deref().unwrap_or_default();
        let state_matches: bool = pending.state.as_bytes().ct_eq(state.as_bytes()).into();
        if !state_matches || pending.shop != shop {
            tracing::warn!(shop = %shop, "OAuth state mismatch");
            return Err(AuthError::InvalidState);
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingParameter("code"))?;

        let token = self
            .client
            .exchange_code(&shop, code)
            .await
            .map_err(AuthError::TokenExchange)?;

        let session = token.into_session(shop, pending.state, now);
        tracing::info!(
            shop = %session.shop,
            session_id = %session.id,
            is_online = session.is_online,
            "Shopify OAuth completed"
        );

        Ok(session)
    }
}
