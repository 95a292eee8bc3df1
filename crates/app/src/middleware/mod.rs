//! HTTP middleware for the app.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions)
//! 4. Security headers (frame-ancestors for the embedding shop)
//!
//! [`RequireShop`] is an extractor rather than a layer so public routes
//! (previews, OAuth, webhooks) stay unauthenticated.

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::RequireShop;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, postgres_store};
