//! Integration test harness for Showroom.
//!
//! Drives the full router (sessions, security headers, extractors) with
//! `tower::ServiceExt::oneshot`. Storage is in memory and Shopify is a
//! `wiremock` server, so no database or network access is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p showroom-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::num::NonZeroU32;

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::SecretString;
use serde_json::{Value, json};
use showroom_app::config::{AppConfig, ShopifyConfig};
use showroom_app::db::{SessionRepository, ShopifySession, Storage};
use showroom_app::middleware::{SESSION_COOKIE_NAME, create_session_layer};
use showroom_app::services::auth::SessionTokenClaims;
use showroom_app::state::AppState;
use showroom_core::ShopDomain;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use wiremock::matchers::{header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The installed shop.
pub const SHOP: &str = "gallery.myshopify.com";

/// App client ID.
pub const API_KEY: &str = "test_api_key";

/// App client secret.
pub const API_SECRET: &str = "shpss_integration_secret";

/// Offline access token stored by [`TestApp::install`].
pub const ACCESS_TOKEN: &str = "shpat_integration";

/// Admin API version the client targets.
pub const API_VERSION: &str = "2025-01";

/// App configuration pointing Shopify calls at `api_origin`.
pub fn config(api_origin: String) -> AppConfig {
    AppConfig {
        database_url: None,
        host: "127.0.0.1".parse().expect("valid ip"),
        port: 3000,
        base_url: "https://showroom.example.net".to_string(),
        shopify: ShopifyConfig {
            api_key: API_KEY.to_string(),
            api_secret: SecretString::from(API_SECRET),
            store: shop(),
            api_version: API_VERSION.to_string(),
            scopes: vec!["read_products".to_string(), "read_customers".to_string()],
            use_online_tokens: false,
            api_origin: Some(api_origin),
        },
        unlock_attempts_per_minute: NonZeroU32::new(5).expect("non-zero"),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}

/// The installed shop as a domain.
pub fn shop() -> ShopDomain {
    ShopDomain::parse(SHOP).expect("valid shop")
}

/// Router plus the state and Shopify double behind it.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub shopify: MockServer,
}

impl TestApp {
    /// App with default configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// App with adjusted configuration.
    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let shopify = MockServer::start().await;

        let mut config = config(shopify.uri());
        customize(&mut config);

        let state = AppState::new(config.clone(), Storage::in_memory());
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let router = showroom_app::app(state.clone(), session_layer);

        Self {
            router,
            state,
            shopify,
        }
    }

    /// Send one request through the full router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Store an offline session for [`SHOP`], as a completed install would.
    pub async fn install(&self) {
        let session = ShopifySession {
            id: ShopifySession::offline_id(&shop()),
            shop: shop(),
            state: "installed".to_string(),
            is_online: false,
            scope: "read_products,read_customers".to_string(),
            access_token: SecretString::from(ACCESS_TOKEN),
            expires: None,
            associated_user_id: None,
        };
        self.state
            .sessions()
            .store(&session)
            .await
            .expect("session stored");
    }

    /// Answer Admin API GraphQL calls carrying the installed token with `data`.
    pub async fn mock_graphql(&self, data: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/admin/api/{API_VERSION}/graphql.json")))
            .and(header_is("X-Shopify-Access-Token", ACCESS_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(&self.shopify)
            .await;
    }

    /// Create a catalog through the API and return its id.
    pub async fn create_catalog(&self, body: &Value) -> String {
        let response = self
            .send(api_post("/api/catalogs", &session_token(SHOP), body))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["id"]
            .as_str()
            .expect("id in response")
            .to_string()
    }
}

/// A buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    /// Body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie, when the response sets one.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
            .map(str::to_string)
    }
}

/// App Bridge session token for `shop`, signed with the app secret.
pub fn session_token(shop: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionTokenClaims {
        iss: format!("https://{shop}/admin"),
        dest: format!("https://{shop}"),
        aud: API_KEY.to_string(),
        sub: Some("42".to_string()),
        exp: now + 60,
        nbf: now - 5,
        iat: now - 5,
        jti: Some("00000000-0000-0000-0000-000000000000".to_string()),
        sid: None,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(API_SECRET.as_bytes()),
    )
    .expect("token encodes")
}

/// A plain GET request.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// A GET request carrying the browser's session cookie.
pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("valid request")
}

/// An authenticated API GET request.
pub fn api_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("valid request")
}

/// An authenticated API POST request with a JSON body.
pub fn api_post(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// A form POST, optionally with the session cookie.
pub fn form_post(uri: &str, form: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let mut body = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in form {
        body.append_pair(k, v);
    }

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder
        .body(Body::from(body.finish()))
        .expect("valid request")
}

/// A JSON POST without authentication.
pub fn json_post(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}
