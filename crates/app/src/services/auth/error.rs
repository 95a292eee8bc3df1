//! Authentication error types.

use axum::http::StatusCode;
use showroom_core::ShopDomainError;
use thiserror::Error;

use crate::shopify::ShopifyError;

/// Errors that can occur while authenticating Shopify requests.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required query parameter is absent.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// The shop parameter is not a valid shop domain.
    #[error("invalid shop: {0}")]
    InvalidShop(#[from] ShopDomainError),

    /// The shop is valid but may not use this app.
    #[error("shop not allowed: {0}")]
    ShopNotAllowed(String),

    /// The request's `hmac` signature does not match.
    #[error("invalid request signature")]
    InvalidHmac,

    /// The OAuth `state` does not match the one issued to this browser.
    #[error("invalid OAuth state")]
    InvalidState,

    /// The App Bridge session token is missing claims, expired or forged.
    #[error("invalid session token: {0}")]
    InvalidSessionToken(String),

    /// A webhook carried a bad `X-Shopify-Hmac-Sha256` signature.
    #[error("invalid webhook signature")]
    InvalidWebhook,

    /// Shopify refused to exchange the authorization code.
    #[error("token exchange failed: {0}")]
    TokenExchange(#[source] ShopifyError),
}

impl AuthError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidShop(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSessionToken(_) | Self::InvalidWebhook => StatusCode::UNAUTHORIZED,
            Self::ShopNotAllowed(_) | Self::InvalidHmac | Self::InvalidState => {
                StatusCode::FORBIDDEN
            }
            Self::TokenExchange(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
