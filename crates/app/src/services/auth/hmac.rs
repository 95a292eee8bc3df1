//! Shopify request signatures.
//!
//! OAuth callbacks and app launches carry an `hmac` query parameter: hex
//! HMAC-SHA256 over every other parameter, sorted by key and joined as
//! `k=v&k=v`. Webhooks carry a base64 HMAC-SHA256 of the raw body in
//! `X-Shopify-Hmac-Sha256`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex signature Shopify attaches to a query string.
///
/// `hmac` and `signature` entries are excluded from the message. Returns
/// `None` only if the key is rejected by the MAC.
#[must_use]
pub fn query_signature<K, V>(params: &[(K, V)], secret: &[u8]) -> Option<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .filter(|(k, _)| *k != "hmac" && *k != "signature")
        .collect();

    // Sort alphabetically by key
    pairs.sort_unstable();

    let message = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    mac(secret, message.as_bytes()).map(hex::encode)
}

/// Verify the `hmac` parameter of a raw (still percent-encoded) query string.
#[must_use]
pub fn verify_query_hmac(raw_query: &str, secret: &[u8]) -> bool {
    let params: Vec<(String, String)> = url::form_urlencoded::parse(raw_query.as_bytes())
        .into_owned()
        .collect();

    let Some(provided) = params
        .iter()
        .find(|(k, _)| k == "hmac")
        .map(|(_, v)| v.to_ascii_lowercase())
    else {
        return false;
    };

    let Some(computed) = query_signature(&params, secret) else {
        return false;
    };

    // Constant-time comparison
    computed.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Verify a webhook body against its base64 `X-Shopify-Hmac-Sha256` header.
#[must_use]
pub fn verify_webhook_hmac(body: &[u8], header: &str, secret: &[u8]) -> bool {
    let Ok(provided) = BASE64.decode(header.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);

    // Constant-time comparison
    mac.verify_slice(&provided).is_ok()
}

/// Base64 webhook signature of `body`.
#[must_use]
pub fn webhook_signature(body: &[u8], secret: &[u8]) -> Option<String> {
    mac(secret, body).map(|m| BASE64.encode(m))
}

fn mac(secret: &[u8], message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}
