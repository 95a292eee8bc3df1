//! Unified error handling for the app.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CatalogError, UnlockError};
use crate::shopify::ShopifyError;

/// Application-level error type returned by route handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// OAuth, request signature or session token failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Browser session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// No usable session for the requesting shop.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request is missing or has invalid fields.
    #[error("{0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource existed but is permanently unavailable.
    #[error("Gone: {0}")]
    Gone(String),

    /// Too many attempts.
    #[error("Too many attempts, try again later")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(e) => e.status_code(),
            Self::Shopify(ShopifyError::Unauthorized(_)) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Database(_) | Self::Shopify(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gone(_) => StatusCode::GONE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl AppError {
    /// Message safe to show the caller; server-side detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Shopify(ShopifyError::Unauthorized(_)) => {
                "Unauthorized: Shopify rejected the access token, reinstall the app".to_string()
            }
            Self::Shopify(_) => "Failed to fetch data from Shopify".to_string(),
            e if e.status_code().is_server_error() => "Internal server error".to_string(),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => Self::Validation(msg),
            CatalogError::NotFound => Self::NotFound("catalog".to_string()),
            CatalogError::PasswordHash => {
                Self::Internal("failed to hash preview password".to_string())
            }
            CatalogError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<UnlockError> for AppError {
    fn from(err: UnlockError) -> Self {
        match err {
            UnlockError::Expired => Self::Gone(err.to_string()),
            UnlockError::RateLimited => Self::RateLimited,
            UnlockError::InvalidCredentials => Self::Unauthorized(err.to_string()),
        }
    }
}

/// Set the Sentry user context to the shop making the request.
pub fn set_sentry_shop(shop: &str) {
    sentry::configure_scope(|scope| {
        scope.set_tag("shop", shop);
    });
}
