//! Security headers middleware.
//!
//! The app renders inside the Shopify admin iframe, so `frame-ancestors`
//! names the shop and `admin.shopify.com` instead of denying all framing.
//! Only the installed store or the shop of the browser session may frame the
//! app; any other `?shop=` gets `'none'`.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::CONTENT_SECURITY_POLICY,
    },
    middleware::Next,
    response::Response,
};
use showroom_core::ShopDomain;
use tower_sessions::Session;

use crate::models::session::keys;
use crate::state::AppState;

/// Headers that do not depend on the request.
const STATIC_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), geolocation=(), microphone=(), payment=(), usb=()",
    ),
    ("x-dns-prefetch-control", "off"),
];

/// Add the static security headers and a per-shop `Content-Security-Policy`
/// (see [`content_security_policy`]) to every response.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let requested = shop_from_query(request.uri().query());
    let signed_in = shop_from_session(request.extensions().get::<Session>()).await;
    let shop = framing_shop(requested, signed_in, &state.config().shopify.store);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in STATIC_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    if let Ok(csp) = HeaderValue::from_str(&content_security_policy(shop.as_ref())) {
        headers.insert(CONTENT_SECURITY_POLICY, csp);
    }

    response
}

/// Build the CSP for a response.
///
/// ```text
/// default-src 'self';
/// script-src 'self' https://cdn.shopify.com;
/// style-src 'self';
/// img-src 'self' https://cdn.shopify.com data:;
/// connect-src 'self';
/// object-src 'none';
/// base-uri 'self';
/// frame-ancestors https://<shop> https://admin.shopify.com   (or 'none')
/// ```
#[must_use]
pub fn content_security_policy(shop: Option<&ShopDomain>) -> String {
    let frame_ancestors = shop.map_or_else(
        || "'none'".to_string(),
        |shop| format!("https://{shop} https://admin.shopify.com"),
    );

    format!(
        "default-src 'self'; \
         script-src 'self' https://cdn.shopify.com; \
         style-src 'self'; \
         img-src 'self' https://cdn.shopify.com data:; \
         connect-src 'self'; \
         object-src 'none'; \
         base-uri 'self'; \
         frame-ancestors {frame_ancestors}"
    )
}

/// Shop allowed to frame the response, if any.
fn framing_shop(
    requested: Option<ShopDomain>,
    signed_in: Option<ShopDomain>,
    store: &ShopDomain,
) -> Option<ShopDomain> {
    match requested {
        Some(shop) if shop == *store || signed_in.as_ref() == Some(&shop) => Some(shop),
        Some(_) => None,
        None => signed_in,
    }
}

fn shop_from_query(query: Option<&str>) -> Option<ShopDomain> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == "shop")
        .and_then(|(_, v)| ShopDomain::parse(&v).ok())
}

async fn shop_from_session(session: Option<&Session>) -> Option<ShopDomain> {
    session?.get::<ShopDomain>(keys::SHOP).await.ok().flatten()
}
