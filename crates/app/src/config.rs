//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_API_KEY` - App client ID from the Shopify Partner dashboard
//! - `SHOPIFY_API_SECRET` - App client secret (HIGH PRIVILEGE)
//! - `SHOPIFY_STORE` - The shop allowed to install the app (e.g., your-store.myshopify.com)
//! - `SHOWROOM_BASE_URL` - Public URL of this app (OAuth redirect base)
//!
//! ## Optional
//! - `SHOWROOM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`;
//!   without either the app runs on in-memory storage)
//! - `SHOWROOM_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOWROOM_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2025-01)
//! - `SHOPIFY_SCOPES` - Comma separated access scopes (default: `read_products,read_customers`)
//! - `SHOPIFY_USE_ONLINE_TOKENS` - Also obtain per-user online tokens (default: false)
//! - `SHOPIFY_API_ORIGIN` - Origin replacing `https://{shop}` for Shopify calls (test doubles)
//! - `PREVIEW_UNLOCK_ATTEMPTS_PER_MINUTE` - Preview password attempts per catalog (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use showroom_core::ShopDomain;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const DEFAULT_API_VERSION: &str = "2025-01";
const DEFAULT_SCOPES: &str = "read_products,read_customers";
const DEFAULT_UNLOCK_ATTEMPTS: u32 = 5;

/// Substrings of values copied from docs or templates (matched lower-case).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the app, without trailing slash
    pub base_url: String,
    /// Shopify app configuration
    pub shopify: ShopifyConfig,
    /// Preview password attempts allowed per catalog per minute
    pub unlock_attempts_per_minute: NonZeroU32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// App client ID (also the expected session token audience)
    pub api_key: String,
    /// App client secret; signs OAuth callbacks, webhooks and session tokens
    pub api_secret: SecretString,
    /// The one shop allowed to install the app
    pub store: ShopDomain,
    /// Shopify API version (e.g., 2025-01)
    pub api_version: String,
    /// Requested access scopes
    pub scopes: Vec<String>,
    /// Whether to continue into the online (per-user) OAuth flow after install
    pub use_online_tokens: bool,
    /// Replacement for `https://{shop}` when talking to Shopify
    pub api_origin: Option<String>,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("scopes", &self.scopes)
            .field("use_online_tokens", &self.use_online_tokens)
            .field("api_origin", &self.api_origin)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables, honouring a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value does
    /// not parse, or the Shopify secret looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let base_url = required("SHOWROOM_BASE_URL")?.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOWROOM_BASE_URL".to_string(), e.to_string()))?;

        let attempts: u32 = parsed("PREVIEW_UNLOCK_ATTEMPTS_PER_MINUTE", DEFAULT_UNLOCK_ATTEMPTS)?;
        let unlock_attempts_per_minute = NonZeroU32::new(attempts).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "PREVIEW_UNLOCK_ATTEMPTS_PER_MINUTE".to_string(),
                "must be greater than zero".to_string(),
            )
        })?;

        Ok(Self {
            database_url: database_url(),
            host: parsed("SHOWROOM_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parsed("SHOWROOM_PORT", 3000)?,
            base_url,
            shopify: ShopifyConfig::from_env()?,
            unlock_attempts_per_minute,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parsed("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parsed("SENTRY_TRACES_SAMPLE_RATE", 1.0)?,
        })
    }

    /// Address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the app is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// OAuth redirect URI registered with Shopify.
    #[must_use]
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/api/auth/callback", self.base_url)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store = ShopDomain::parse(&required("SHOPIFY_STORE")?)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPIFY_STORE".to_string(), e.to_string()))?;

        let api_secret = required("SHOPIFY_API_SECRET")?;
        check_secret("SHOPIFY_API_SECRET", &api_secret)?;

        Ok(Self {
            api_key: required("SHOPIFY_API_KEY")?,
            api_secret: SecretString::from(api_secret),
            store,
            api_version: optional("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            scopes: parse_scopes(&optional("SHOPIFY_SCOPES").unwrap_or_else(|| DEFAULT_SCOPES.to_string())),
            use_online_tokens: optional("SHOPIFY_USE_ONLINE_TOKENS")
                .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
            api_origin: optional("SHOPIFY_API_ORIGIN").map(|s| s.trim_end_matches('/').to_string()),
        })
    }

    /// Expose the client secret for signing operations.
    #[must_use]
    pub fn secret_bytes(&self) -> &[u8] {
        self.api_secret.expose_secret().as_bytes()
    }
}

// =============================================================================
// Environment access
// =============================================================================

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Unset and empty variables both count as absent.
fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Parse `key` if set, `default` otherwise.
fn parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// `SHOWROOM_DATABASE_URL`, or the `DATABASE_URL` Fly.io sets on postgres attach.
fn database_url() -> Option<SecretString> {
    optional("SHOWROOM_DATABASE_URL")
        .or_else(|| optional("DATABASE_URL"))
        .map(SecretString::from)
}

/// Split a comma separated scope list, dropping blanks.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

// =============================================================================
// Secret checks
// =============================================================================

/// Reject placeholder values and secrets with too little variety.
fn check_secret(key: &str, secret: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("looks like a placeholder (contains '{pattern}')"),
        ));
    }

    let bits = bits_per_char(secret);
    if bits < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("{bits:.2} bits/char is below {MIN_ENTROPY_BITS_PER_CHAR:.1}, use the secret issued by Shopify"),
        ));
    }

    Ok(())
}

/// Shannon entropy of the character distribution.
#[allow(clippy::cast_precision_loss)]
fn bits_per_char(s: &str) -> f64 {
    let mut counts: BTreeMap<char, u32> = BTreeMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    counts
        .values()
        .map(|&n| f64::from(n) / f64::from(total))
        .map(|p| -p * p.log2())
        .sum()
}

/// Configuration used by unit tests.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "https://showroom.example.net".to_string(),
        shopify: ShopifyConfig {
            api_key: "test_api_key".to_string(),
            api_secret: SecretString::from("shpss_test_secret"),
            store: ShopDomain::parse("gallery.myshopify.com").unwrap(),
            api_version: DEFAULT_API_VERSION.to_string(),
            scopes: parse_scopes(DEFAULT_SCOPES),
            use_online_tokens: false,
            api_origin: None,
        },
        unlock_attempts_per_minute: NonZeroU32::new(DEFAULT_UNLOCK_ATTEMPTS).unwrap(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}
