//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Utc;
use showroom_core::ShopDomain;

use crate::config::AppConfig;
use crate::db::sessions::load_active;
use crate::db::{CatalogRepository, RepositoryError, SessionRepository, ShopifySession, Storage};
use crate::services::PreviewGate;
use crate::shopify::ShopifyClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything in it is built
/// once at start-up and injected here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    storage: Storage,
    shopify: ShopifyClient,
    preview_gate: PreviewGate,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - App configuration
    /// * `storage` - Session and catalog repositories
    #[must_use]
    pub fn new(config: AppConfig, storage: Storage) -> Self {
        let shopify = ShopifyClient::new(&config.shopify);
        let preview_gate = PreviewGate::new(config.unlock_attempts_per_minute);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                shopify,
                preview_gate,
            }),
        }
    }

    /// Get a reference to the app configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the repositories.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    /// Get the Shopify session repository.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionRepository {
        self.inner.storage.sessions.as_ref()
    }

    /// Get the catalog repository.
    #[must_use]
    pub fn catalogs(&self) -> &dyn CatalogRepository {
        self.inner.storage.catalogs.as_ref()
    }

    /// Get a reference to the Shopify API client.
    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    /// Get the preview unlock gate.
    #[must_use]
    pub fn preview_gate(&self) -> &PreviewGate {
        &self.inner.preview_gate
    }

    /// Find a usable session for API calls on behalf of `shop`.
    ///
    /// Prefers the browser's online session when it is still active and
    /// belongs to `shop`, then the shop's offline session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the session store fails.
    pub async fn api_session(
        &self,
        shop: &ShopDomain,
        online_session_id: Option<&str>,
    ) -> Result<Option<ShopifySession>, RepositoryError> {
        let now = Utc::now();

        if let Some(id) = online_session_id
            && let Some(session) = load_active(self.sessions(), id, now).await?
            && &session.shop == shop
        {
            return Ok(Some(session));
        }

        load_active(self.sessions(), &ShopifySession::offline_id(shop), now).await
    }
}
