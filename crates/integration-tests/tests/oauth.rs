//! Install, launch and uninstall scenarios.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use showroom_app::db::{SessionRepository, ShopifySession};
use showroom_app::services::auth::{query_signature, webhook_signature};
use showroom_integration_tests::{
    ACCESS_TOKEN, API_SECRET, SHOP, TestApp, TestResponse, form_post, get, get_with_cookie, shop,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const HOST: &str = "YWRtaW4uc2hvcGlmeS5jb20vc3RvcmUvZ2FsbGVyeQ";

/// Query string signed the way Shopify signs redirects.
fn signed_query(params: &[(&str, &str)], secret: &str) -> String {
    let hmac = query_signature(params, secret.as_bytes()).unwrap();
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in params {
        query.append_pair(k, v);
    }
    query.append_pair("hmac", &hmac);
    query.finish()
}

/// `state` parameter of the Shopify consent URL.
fn consent_state(response: &TestResponse) -> String {
    let location = url::Url::parse(response.location().unwrap()).unwrap();
    location
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

async fn mock_token_exchange(app: &TestApp, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .and(body_partial_json(json!({"code": "auth-code"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&app.shopify)
        .await;
}

fn webhook(body: &'static str, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/webhooks/app-uninstalled")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Shopify-Hmac-Sha256", signature)
        .header("X-Shopify-Shop-Domain", SHOP)
        .body(Body::from(body))
        .unwrap()
}

// =============================================================================
// OAuth
// =============================================================================

#[tokio::test]
async fn test_install_flow_stores_offline_session() {
    let app = TestApp::new().await;
    mock_token_exchange(
        &app,
        json!({"access_token": ACCESS_TOKEN, "scope": "read_products,read_customers"}),
    )
    .await;

    let begin = app.send(get(&format!("/api/auth?shop={SHOP}"))).await;
    assert_eq!(begin.status, StatusCode::FOUND);
    assert!(
        begin
            .location()
            .unwrap()
            .starts_with("https://gallery.myshopify.com/admin/oauth/authorize?client_id=test_api_key")
    );
    let cookie = begin.session_cookie().expect("session cookie");
    let state = consent_state(&begin);

    let query = signed_query(
        &[
            ("code", "auth-code"),
            ("host", HOST),
            ("shop", SHOP),
            ("state", state.as_str()),
            ("timestamp", "1700000000"),
        ],
        API_SECRET,
    );
    let callback = app
        .send(get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie))
        .await;
    assert_eq!(callback.status, StatusCode::FOUND);
    assert_eq!(
        callback.location(),
        Some(format!("/admin?shop={SHOP}&host={HOST}").as_str())
    );

    let stored = app
        .state
        .sessions()
        .load(&ShopifySession::offline_id(&shop()))
        .await
        .unwrap()
        .expect("offline session");
    assert!(!stored.is_online);
    assert_eq!(stored.scope, "read_products,read_customers");

    // The new browser session identifies the shop without a session token
    let cookie = callback.session_cookie().expect("cycled session cookie");
    app.mock_graphql(json!({"products": {"edges": []}})).await;
    let response = app.send(get_with_cookie("/api/products", &cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"products": []}));
}

#[tokio::test]
async fn test_offline_install_continues_with_online_flow() {
    let app = TestApp::with_config(|config| config.shopify.use_online_tokens = true).await;
    mock_token_exchange(&app, json!({"access_token": ACCESS_TOKEN, "scope": "read_products"})).await;

    let begin = app.send(get(&format!("/api/auth?shop={SHOP}"))).await;
    let cookie = begin.session_cookie().unwrap();
    let state = consent_state(&begin);

    let query = signed_query(
        &[("code", "auth-code"), ("shop", SHOP), ("state", state.as_str())],
        API_SECRET,
    );
    let callback = app
        .send(get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie))
        .await;
    assert_eq!(callback.status, StatusCode::FOUND);
    assert_eq!(
        callback.location(),
        Some(format!("/api/auth/online?shop={SHOP}").as_str())
    );
}

#[tokio::test]
async fn test_online_begin_requests_per_user_token() {
    let app = TestApp::new().await;

    let begin = app.send(get(&format!("/api/auth/online?shop={SHOP}"))).await;
    assert_eq!(begin.status, StatusCode::FOUND);
    assert!(begin.location().unwrap().contains("grant_options%5B%5D=per-user"));
}

#[tokio::test]
async fn test_begin_rejects_other_shops() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/auth?shop=other.myshopify.com")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.send(get("/api/auth?shop=evil.example.com")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.send(get("/api/auth")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_rejects_bad_signature() {
    let app = TestApp::new().await;
    let begin = app.send(get(&format!("/api/auth?shop={SHOP}"))).await;
    let cookie = begin.session_cookie().unwrap();
    let state = consent_state(&begin);

    let query = signed_query(
        &[("code", "auth-code"), ("shop", SHOP), ("state", state.as_str())],
        "not the app secret",
    );
    let response = app
        .send(get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let stored = app
        .state
        .sessions()
        .load(&ShopifySession::offline_id(&shop()))
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let app = TestApp::new().await;
    let begin = app.send(get(&format!("/api/auth?shop={SHOP}"))).await;
    let cookie = begin.session_cookie().unwrap();

    let query = signed_query(
        &[("code", "auth-code"), ("shop", SHOP), ("state", "forged")],
        API_SECRET,
    );
    let response = app
        .send(get_with_cookie(&format!("/api/auth/callback?{query}"), &cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Without the browser session there is no pending flow at all
    let query = signed_query(
        &[("code", "auth-code"), ("shop", SHOP), ("state", "forged")],
        API_SECRET,
    );
    let response = app.send(get(&format!("/api/auth/callback?{query}"))).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Launch
// =============================================================================

#[tokio::test]
async fn test_launch_without_install_starts_oauth() {
    let app = TestApp::new().await;

    let response = app.send(get(&format!("/?shop={SHOP}"))).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some(format!("/api/auth?shop={SHOP}").as_str()));

    let response = app.send(get(&format!("/?shop={SHOP}&embedded=1"))).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert!(
        response
            .location()
            .unwrap()
            .starts_with("/exitiframe?redirectUri=%2Fapi%2Fauth")
    );
}

#[tokio::test]
async fn test_signed_launch_opens_admin() {
    let app = TestApp::new().await;
    app.install().await;

    let query = signed_query(
        &[("embedded", "1"), ("host", HOST), ("shop", SHOP), ("timestamp", "1700000000")],
        API_SECRET,
    );
    let response = app.send(get(&format!("/?{query}"))).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.location(),
        Some(format!("/admin?shop={SHOP}&host={HOST}").as_str())
    );
    let cookie = response.session_cookie().expect("session cookie");

    // A later visit without parameters resumes the same shop
    let response = app.send(get_with_cookie("/", &cookie)).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.location(),
        Some(format!("/admin?shop={SHOP}&host={HOST}").as_str())
    );
}

#[tokio::test]
async fn test_logout_forgets_the_shop() {
    let app = TestApp::new().await;
    app.install().await;

    let query = signed_query(&[("host", HOST), ("shop", SHOP)], API_SECRET);
    let cookie = app
        .send(get(&format!("/?{query}")))
        .await
        .session_cookie()
        .expect("session cookie");

    let response = app.send(form_post("/auth/logout", &[], Some(&cookie))).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let response = app.send(get_with_cookie("/", &cookie)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // The shop's offline install is untouched
    let stored = app
        .state
        .sessions()
        .load(&ShopifySession::offline_id(&shop()))
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_launch_rejects_forged_signature() {
    let app = TestApp::new().await;
    app.install().await;

    let query = signed_query(&[("host", HOST), ("shop", SHOP)], "forged");
    let response = app.send(get(&format!("/?{query}"))).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.send(get("/")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_exit_iframe_only_targets_app_paths() {
    let app = TestApp::new().await;

    let response = app
        .send(get("/exitiframe?redirectUri=%2Fapi%2Fauth%3Fshop%3Dgallery.myshopify.com"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .text()
            .contains("data-redirect-uri=\"/api/auth?shop=gallery.myshopify.com\"")
    );

    for target in [
        "https%3A%2F%2Fevil.example.com",
        "%2F%2Fevil.example.com",
        "%2F%09%2Fevil.example.com",
        "%2F%0A%2Fevil.example.com",
        "",
    ] {
        let response = app
            .send(get(&format!("/exitiframe?redirectUri={target}")))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{target}");
    }
}

// =============================================================================
// Webhooks
// =============================================================================

#[tokio::test]
async fn test_uninstall_webhook_deletes_sessions() {
    let app = TestApp::new().await;
    app.install().await;

    let body = r#"{"id":1,"domain":"gallery.myshopify.com"}"#;
    let signature = webhook_signature(body.as_bytes(), API_SECRET.as_bytes()).unwrap();

    let response = app.send(webhook(body, &signature)).await;
    assert_eq!(response.status, StatusCode::OK);

    let remaining = app.state.sessions().find_by_shop(&shop()).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_uninstall_webhook_rejects_bad_signature() {
    let app = TestApp::new().await;
    app.install().await;

    let body = r#"{"id":1,"domain":"gallery.myshopify.com"}"#;
    let signature = webhook_signature(body.as_bytes(), b"forged").unwrap();

    let response = app.send(webhook(body, &signature)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let remaining = app.state.sessions().find_by_shop(&shop()).await.unwrap();
    assert_eq!(remaining.len(), 1);
}

// =============================================================================
// Health and headers
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new().await;

    let response = app.send(get("/health")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ok");

    let response = app.send(get("/health/ready")).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_frame_ancestors_follow_the_shop() {
    let app = TestApp::new().await;

    let response = app.send(get(&format!("/health?shop={SHOP}"))).await;
    let csp = response.headers[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
    assert!(csp.contains("frame-ancestors https://gallery.myshopify.com https://admin.shopify.com"));

    let response = app.send(get("/health")).await;
    let csp = response.headers[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
    assert!(csp.ends_with("frame-ancestors 'none'"));
}

#[tokio::test]
async fn test_foreign_shop_cannot_frame_the_admin() {
    let app = TestApp::new().await;
    app.install().await;
    let params = [("host", "YWRtaW4"), ("shop", SHOP)];
    let hmac = query_signature(&params, API_SECRET.as_bytes()).unwrap();
    let cookie = app
        .send(get(&format!("/?host=YWRtaW4&shop={SHOP}&hmac={hmac}")))
        .await
        .session_cookie()
        .expect("session cookie");

    for uri in [
        "/health?shop=attacker.myshopify.com",
        "/admin?shop=attacker.myshopify.com",
    ] {
        let response = app.send(get_with_cookie(uri, &cookie)).await;
        let csp = response.headers[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.ends_with("frame-ancestors 'none'"), "{uri}: {csp}");
    }

    let response = app.send(get("/health?shop=attacker.myshopify.com")).await;
    let csp = response.headers[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
    assert!(csp.ends_with("frame-ancestors 'none'"));
}
