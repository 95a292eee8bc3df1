//! Shopify Admin API access: OAuth token exchange and GraphQL reads.
//!
//! # Architecture
//!
//! - Every GraphQL query has an explicit request and response type
//!   implementing `graphql_client::GraphQLQuery` (see [`queries`])
//! - Responses are decoded strictly; a shape mismatch is
//!   [`ShopifyError::Parse`] rather than a silently empty field
//! - Calls are made with the access token of a stored [`ShopifySession`]
//! - Nothing is retried
//!
//! # Example
//!
//! ```rust,ignore
//! use showroom_app::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new(&config.shopify);
//! let products = client.get_products(&session, 10).await?;
//! ```
//!
//! [`ShopifySession`]: crate::db::ShopifySession

mod client;
mod conversions;
pub mod queries;

pub use client::{AccessTokenResponse, AssociatedUser, ShopifyClient};

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Errors talking to Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GraphQL errors: {}", join_messages(.0))]
    GraphQL(Vec<GraphQLError>),

    /// Response body did not match the query's response type.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// HTTP 429; carries `Retry-After` in seconds.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// HTTP 401 from the Admin API, usually an uninstalled app.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("OAuth error: {0}")]
    OAuth(String),
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if !self.path.is_empty() {
            let path: Vec<String> = self
                .path
                .iter()
                .map(|p| p.as_str().map_or_else(|| p.to_string(), ToString::to_string))
                .collect();
            write!(f, " (at {})", path.join("."))?;
        }
        Ok(())
    }
}

fn join_messages(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
