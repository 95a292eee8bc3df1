//! Showroom - embedded Shopify catalog app.
//!
//! This binary serves the embedded admin, the catalog API and the public
//! catalog previews.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering
//! - Shopify Admin API (GraphQL) for products and customers
//! - `PostgreSQL` for Shopify sessions, catalogs and browser sessions
//!
//! Without a database URL everything is kept in memory, which is only
//! suitable for local development.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;

use axum::Router;
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use showroom_app::config::AppConfig;
use showroom_app::db::{self, Storage};
use showroom_app::middleware::{create_session_layer, postgres_store};
use showroom_app::state::AppState;
use tokio::signal;
use tower_sessions::MemoryStore;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "showroom_app=info,tower_http=debug";

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Sentry has to exist before the tracing layer forwards to it
    let sentry_guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Cow::Owned),
                sample_rate: config.sentry_sample_rate,
                traces_sample_rate: config.sentry_traces_sample_rate,
                attach_stacktrace: true,
                send_default_pii: false,
                ..Default::default()
            },
        ))
    });
    init_tracing();
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    let app = build_router(&config)
        .await
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("showroom listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Text logs locally, flattened JSON on Fly.io. `RUST_LOG` overrides the filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let on_fly = std::env::var_os("FLY_APP_NAME").is_some();

    tracing_subscriber::registry()
        .with(filter)
        .with(on_fly.then(|| fmt::layer().json().flatten_event(true)))
        .with((!on_fly).then(fmt::layer))
        .with(sentry_tracing::layer().event_filter(|meta: &tracing::Metadata<'_>| match *meta.level() {
            Level::ERROR | Level::WARN => EventFilter::Event,
            Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
            Level::TRACE => EventFilter::Ignore,
        }))
        .init();
}

/// Wire storage and browser sessions to the configured backend.
///
/// Migrations are not applied here; run `showroom-cli migrate` first.
async fn build_router(config: &AppConfig) -> Router {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("No database configured, sessions and catalogs are kept in memory");
        let sessions = create_session_layer(MemoryStore::default(), config);
        let state = AppState::new(config.clone(), Storage::in_memory());
        return showroom_app::app(state, sessions);
    };

    let pool = db::create_pool(database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let store = postgres_store(&pool).expect("Failed to create session store");
    let sessions = create_session_layer(store, config);
    showroom_app::app(AppState::new(config.clone(), Storage::postgres(pool)), sessions)
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        }
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received, draining connections");
}
