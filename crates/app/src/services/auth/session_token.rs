//! App Bridge session tokens.
//!
//! The embedded admin sends `Authorization: Bearer <jwt>` where the JWT is
//! signed with the app's client secret (HS256). `aud` is the client ID and
//! `dest` is the shop's origin.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use showroom_core::ShopDomain;

use super::AuthError;

/// Claims carried by a Shopify session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokenClaims {
    /// Shop admin URL, e.g. `https://gallery.myshopify.com/admin`.
    pub iss: String,
    /// Shop origin, e.g. `https://gallery.myshopify.com`.
    pub dest: String,
    /// App client ID.
    pub aud: String,
    /// Staff member id.
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
}

/// Verify a session token and return the shop it was issued for.
///
/// # Errors
///
/// Returns `AuthError::InvalidSessionToken` if the signature, audience or
/// lifetime is wrong, or if `iss` and `dest` disagree.
pub fn verify_session_token(
    token: &str,
    api_key: &str,
    secret: &[u8],
) -> Result<(ShopDomain, SessionTokenClaims), AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[api_key]);
    validation.validate_nbf = true;
    validation.leeway = 5;

    let data = decode::<SessionTokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| AuthError::InvalidSessionToken(e.to_string()))?;
    let claims = data.claims;

    let shop = ShopDomain::parse(&claims.dest)
        .map_err(|e| AuthError::InvalidSessionToken(format!("dest: {e}")))?;

    let issuer_host = claims
        .iss
        .strip_prefix("https://")
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default();
    if issuer_host != shop.as_str() {
        return Err(AuthError::InvalidSessionToken(
            "issuer does not match destination".to_string(),
        ));
    }

    Ok((shop, claims))
}
