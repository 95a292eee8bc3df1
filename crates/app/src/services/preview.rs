//! Server-side gate for public catalog previews.
//!
//! A protected catalog is only rendered after the visitor submits the
//! matching username and password. Success is remembered in the browser's
//! server-side session, keyed by catalog id. Password attempts are limited
//! per catalog.

use std::num::NonZeroU32;
use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use chrono::{DateTime, Utc};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use showroom_core::{Catalog, CatalogId, PreviewAccess};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tower_sessions::Session;

use crate::models::session::keys;

/// Reasons an unlock attempt fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnlockError {
    /// The catalog expired; no credentials can open it.
    #[error("this catalog has expired")]
    Expired,

    /// Too many attempts for this catalog.
    #[error("too many attempts, try again in a minute")]
    RateLimited,

    /// Username or password did not match.
    #[error("incorrect username or password")]
    InvalidCredentials,
}

/// Per-catalog unlock attempt limiter and credential check.
#[derive(Clone)]
pub struct PreviewGate {
    limiter: Arc<DefaultKeyedRateLimiter<CatalogId>>,
}

impl PreviewGate {
    /// Allow `per_minute` password attempts per catalog.
    #[must_use]
    pub fn new(per_minute: NonZeroU32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
        }
    }

    /// Check submitted credentials against a catalog.
    ///
    /// Public catalogs unlock without consuming an attempt.
    ///
    /// # Errors
    ///
    /// Returns `UnlockError::Expired` for expired catalogs, `UnlockError::RateLimited`
    /// when the attempt budget is spent and `UnlockError::InvalidCredentials`
    /// on mismatch.
    pub fn unlock(
        &self,
        catalog: &Catalog,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), UnlockError> {
        if catalog.is_expired(now) {
            return Err(UnlockError::Expired);
        }

        let (Some(expected_user), Some(hash)) = (&catalog.username, &catalog.password_hash) else {
            return Ok(());
        };

        // Catalogs with a full budget again (or deleted since) leave the map
        self.limiter.retain_recent();
        if self.limiter.check_key(&catalog.id).is_err() {
            tracing::warn!(catalog_id = %catalog.id, "Preview unlock rate limited");
            return Err(UnlockError::RateLimited);
        }

        let user_matches: bool = expected_user
            .as_bytes()
            .ct_eq(username.trim().as_bytes())
            .into();
        let password_matches = verify_password(password, hash);

        if user_matches && password_matches {
            tracing::info!(catalog_id = %catalog.id, "Preview unlocked");
            Ok(())
        } else {
            tracing::info!(catalog_id = %catalog.id, "Preview unlock rejected");
            Err(UnlockError::InvalidCredentials)
        }
    }

    /// Number of catalogs with limiter state.
    #[must_use]
    pub fn tracked_catalogs(&self) -> usize {
        self.limiter.len()
    }
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Browser session markers
// =============================================================================

/// Whether this browser unlocked the catalog earlier.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn is_unlocked(session: &Session, id: CatalogId) -> Result<bool, tower_sessions::session::Error> {
    let unlocked: Vec<CatalogId> = session
        .get(keys::PREVIEW_UNLOCKED)
        .await?
        .unwrap_or_default();
    Ok(unlocked.contains(&id))
}

/// Remember that this browser unlocked the catalog.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn mark_unlocked(session: &Session, id: CatalogId) -> Result<(), tower_sessions::session::Error> {
    let mut unlocked: Vec<CatalogId> = session
        .get(keys::PREVIEW_UNLOCKED)
        .await?
        .unwrap_or_default();
    if !unlocked.contains(&id) {
        unlocked.push(id);
        session.insert(keys::PREVIEW_UNLOCKED, unlocked).await?;
    }
    Ok(())
}

/// Evaluate what this browser may see of a catalog.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn access_for(
    session: &Session,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<PreviewAccess, tower_sessions::session::Error> {
    let unlocked = catalog.is_protected() && is_unlocked(session, catalog.id).await?;
    Ok(catalog.preview_access(now, unlocked))
}
