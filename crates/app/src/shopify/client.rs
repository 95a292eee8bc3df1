//! Shopify Admin API client with OAuth code exchange.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use graphql_client::GraphQLQuery;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use showroom_core::{Customer, ProductSnapshot, ShopDomain};
use tracing::instrument;

use crate::config::ShopifyConfig;
use crate::db::ShopifySession;

use super::conversions::{convert_customer_connection, convert_product_connection};
use super::queries::{GetCustomers, GetProducts, get_customers, get_products};
use super::{GraphQLError, ShopifyError};

/// Shopify Admin API client.
///
/// Holds the app credentials; per-shop access tokens come from the session
/// passed to each call.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
    api_version: String,
    scopes: String,
    /// Replaces `https://{shop}` for API calls when set.
    origin: Option<String>,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Access token response from Shopify's OAuth endpoint.
///
/// Online (per-user) grants also carry `expires_in` and `associated_user`.
#[derive(Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: SecretString,
    pub scope: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub associated_user: Option<AssociatedUser>,
}

impl std::fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .field("associated_user", &self.associated_user)
            .finish()
    }
}

/// Staff member an online token was issued for.
#[derive(Debug, Clone, Deserialize)]
pub struct AssociatedUser {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
}

impl AccessTokenResponse {
    /// Build the session to persist for `shop`.
    #[must_use]
    pub fn into_session(self, shop: ShopDomain, state: String, now: DateTime<Utc>) -> ShopifySession {
        let (id, is_online, associated_user_id) = match &self.associated_user {
            Some(user) => (ShopifySession::online_id(&shop, user.id), true, Some(user.id)),
            None => (ShopifySession::offline_id(&shop), false, None),
        };

        ShopifySession {
            id,
            shop,
            state,
            is_online,
            scope: self.scope,
            access_token: self.access_token,
            expires: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            associated_user_id,
        }
    }
}

impl ShopifyClient {
    /// Create a new client from the app configuration.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self {
            inner: Arc::new(ShopifyClientInner {
                client: reqwest::Client::new(),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                api_version: config.api_version.clone(),
                scopes: config.scopes.join(","),
                origin: config.api_origin.clone(),
            }),
        }
    }

    /// Get the app's client ID.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    fn origin(&self, shop: &ShopDomain) -> String {
        self.inner
            .origin
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Generate the OAuth authorization URL for `shop`.
    ///
    /// Online requests ask for a per-user token (`grant_options[]=per-user`).
    #[must_use]
    pub fn authorization_url(
        &self,
        shop: &ShopDomain,
        redirect_uri: &str,
        state: &str,
        online: bool,
    ) -> String {
        let mut url = format!(
            "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            shop,
            urlencoding::encode(&self.inner.api_key),
            urlencoding::encode(&self.inner.scopes),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        );
        if online {
            url.push_str("&grant_options%5B%5D=per-user");
        }
        url
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if Shopify rejects the code.
    /// Returns `ShopifyError::Http` if the HTTP request fails.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessTokenResponse, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.origin(shop));

        let response = self
            .inner
            .client
            .post(&url)
            .json(&AccessTokenRequest {
                client_id: &self.inner.api_key,
                client_secret: self.inner.api_secret.expose_secret(),
                code,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "Token exchange failed ({status}): {text}"
            )));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL query with the session's access token.
    async fn execute<Q: GraphQLQuery>(
        &self,
        session: &ShopifySession,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let endpoint = format!(
            "{}/admin/api/{}/graphql.json",
            self.origin(&session.shop),
            self.inner.api_version
        );

        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&endpoint)
            .header("X-Shopify-Access-Token", session.access_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2);
                return Err(ShopifyError::RateLimited(retry_after));
            }
            reqwest::StatusCode::UNAUTHORIZED => {
                return Err(ShopifyError::Unauthorized(
                    "Invalid or expired access token".to_string(),
                ));
            }
            _ => {}
        }

        let bytes = response.error_for_status()?.bytes().await?;
        let GraphQLResponse { data, errors } =
            serde_json::from_slice::<GraphQLResponse<Q::ResponseData>>(&bytes)?;
        let errors = errors.unwrap_or_default();

        match data {
            Some(data) if errors.is_empty() => Ok(data),
            _ if !errors.is_empty() => Err(ShopifyError::GraphQL(errors)),
            _ => Err(ShopifyError::GraphQL(vec![GraphQLError::new("No data in response")])),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get the first `first` products as catalog snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, session), fields(shop = %session.shop))]
    pub async fn get_products(
        &self,
        session: &ShopifySession,
        first: i64,
    ) -> Result<Vec<ProductSnapshot>, ShopifyError> {
        let response = self
            .execute::<GetProducts>(session, get_products::Variables { first })
            .await?;
        Ok(convert_product_connection(response))
    }

    /// Get the first `first` customers.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, session), fields(shop = %session.shop))]
    pub async fn get_customers(
        &self,
        session: &ShopifySession,
        first: i64,
    ) -> Result<Vec<Customer>, ShopifyError> {
        let response = self
            .execute::<GetCustomers>(session, get_customers::Variables { first })
            .await?;
        Ok(convert_customer_connection(response))
    }
}
