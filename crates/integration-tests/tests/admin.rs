//! Embedded admin page scenarios.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use showroom_app::services::auth::query_signature;
use showroom_integration_tests::{
    API_SECRET, SHOP, TestApp, api_get, form_post, get, get_with_cookie, session_token,
};

/// Launch the installed app the way the Shopify admin does and return the
/// browser's session cookie.
async fn launch(app: &TestApp) -> String {
    let params = [("host", "YWRtaW4"), ("shop", SHOP)];
    let hmac = query_signature(&params, API_SECRET.as_bytes()).unwrap();
    let response = app
        .send(get(&format!("/?host=YWRtaW4&shop={SHOP}&hmac={hmac}")))
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    response.session_cookie().expect("session cookie")
}

fn graphql_data() -> serde_json::Value {
    json!({
        "products": {"edges": [
            {"node": {
                "id": "gid://shopify/Product/7",
                "title": "Harbour at Dusk",
                "featuredImage": null,
                "priceRangeV2": {"minVariantPrice": {"amount": "1200.0", "currencyCode": "EUR"}},
                "artist": {"value": "A. Moreau"}
            }},
            {"node": {
                "id": "gid://shopify/Product/8",
                "title": "Blue Heron",
                "featuredImage": null,
                "priceRangeV2": {"minVariantPrice": {"amount": "80.0", "currencyCode": "EUR"}}
            }}
        ]},
        "customers": {"edges": [
            {"node": {
                "id": "gid://shopify/Customer/1",
                "firstName": "Mina",
                "lastName": "Ito",
                "defaultEmailAddress": {"emailAddress": "mina@example.com"}
            }}
        ]}
    })
}

/// Value of the hidden form token field.
fn form_token(html: &str) -> String {
    let marker = "name=\"form_token\" value=\"";
    let start = html.find(marker).unwrap() + marker.len();
    let end = start + html[start..].find('"').unwrap();
    html[start..end].to_string()
}

#[tokio::test]
async fn test_dashboard_lists_shop_data() {
    let app = TestApp::new().await;
    app.install().await;
    app.mock_graphql(graphql_data()).await;
    let cookie = launch(&app).await;

    let response = app
        .send(get_with_cookie(&format!("/admin?shop={SHOP}"), &cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let html = response.text();
    assert!(html.contains("Harbour at Dusk"));
    assert!(html.contains("mina@example.com"));
    assert!(!html.contains("Could not load data from Shopify."));
}

#[tokio::test]
async fn test_admin_pages_without_shop_session_restart_oauth() {
    let app = TestApp::new().await;
    app.install().await;

    for uri in ["/admin", "/admin?shop=gallery.myshopify.com", "/admin/catalogs/new"] {
        let response = app.send(get(uri)).await;
        assert_eq!(response.status, StatusCode::FOUND, "{uri}");
        assert_eq!(
            response.location(),
            Some("/exitiframe?redirectUri=%2Fapi%2Fauth%3Fshop%3Dgallery.myshopify.com"),
            "{uri}"
        );
    }

    // Form posts still need a shop session
    let response = app
        .send(form_post("/admin/catalogs", &[("title", "x")], None))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_catalog_from_form() {
    let app = TestApp::new().await;
    app.install().await;
    app.mock_graphql(graphql_data()).await;
    let cookie = launch(&app).await;

    let response = app
        .send(get_with_cookie("/admin/catalogs/new", &cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Blue Heron"));
    let token = form_token(&html);

    let response = app
        .send(form_post(
            "/admin/catalogs",
            &[
                ("form_token", token.as_str()),
                ("title", "Autumn viewing"),
                ("lead_text", ""),
                ("product", "gid://shopify/Product/8"),
                ("username", "buyer"),
                ("password", "open sesame"),
                ("expires_at", ""),
            ],
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(response.location().unwrap().starts_with("/admin?shop="));

    let list = app
        .send(api_get("/api/catalogs/list", &session_token(SHOP)))
        .await
        .json();
    let catalog = &list["catalogs"][0];
    assert_eq!(catalog["title"], "Autumn viewing");
    assert_eq!(catalog["isProtected"], true);
    assert_eq!(
        catalog["products"],
        json!([{"id": "gid://shopify/Product/8", "title": "Blue Heron", "price": "80.0 EUR"}])
    );
}

#[tokio::test]
async fn test_invalid_form_is_rendered_again() {
    let app = TestApp::new().await;
    app.install().await;
    app.mock_graphql(graphql_data()).await;
    let cookie = launch(&app).await;

    let html = app
        .send(get_with_cookie("/admin/catalogs/new", &cookie))
        .await
        .text();
    let token = form_token(&html);

    let response = app
        .send(form_post(
            "/admin/catalogs",
            &[
                ("form_token", token.as_str()),
                ("title", "Half protected"),
                ("product", "gid://shopify/Product/7"),
                ("username", "buyer"),
            ],
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let html = response.text();
    assert!(html.contains("username and password must be set together"));
    assert!(html.contains("Half protected"));

    let list = app
        .send(api_get("/api/catalogs/list", &session_token(SHOP)))
        .await
        .json();
    assert_eq!(list["catalogs"], json!([]));
}

#[tokio::test]
async fn test_forms_require_the_session_token() {
    let app = TestApp::new().await;
    app.install().await;
    app.mock_graphql(graphql_data()).await;
    let cookie = launch(&app).await;
    let id = app
        .create_catalog(&json!({"title": "Keep me", "products": []}))
        .await;

    let response = app
        .send(form_post(
            "/admin/catalogs/delete",
            &[("form_token", "guessed"), ("id", id.as_str())],
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .send(api_get(
            &format!("/api/catalogs/get?id={id}"),
            &session_token(SHOP),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_bulk_delete_from_dashboard() {
    let app = TestApp::new().await;
    app.install().await;
    app.mock_graphql(graphql_data()).await;
    let cookie = launch(&app).await;
    let id = app
        .create_catalog(&json!({"title": "Old show", "products": []}))
        .await;

    let html = app
        .send(get_with_cookie(&format!("/admin?shop={SHOP}"), &cookie))
        .await
        .text();
    assert!(html.contains("Old show"));
    let token = form_token(&html);

    let response = app
        .send(form_post(
            "/admin/catalogs/delete",
            &[("form_token", token.as_str()), ("id", id.as_str())],
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let response = app
        .send(api_get(
            &format!("/api/catalogs/get?id={id}"),
            &session_token(SHOP),
        ))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
