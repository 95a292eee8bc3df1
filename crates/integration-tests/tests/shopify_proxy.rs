//! Product and customer proxy scenarios.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use showroom_integration_tests::{API_VERSION, SHOP, TestApp, api_get, session_token};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_products_require_an_installed_shop() {
    let app = TestApp::new().await;

    let response = app
        .send(api_get("/api/products", &session_token(SHOP)))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(
        response.json()["error"]
            .as_str()
            .unwrap()
            .starts_with("Unauthorized")
    );
}

#[tokio::test]
async fn test_products_are_proxied_as_snapshots() {
    let app = TestApp::new().await;
    app.install().await;
    app.mock_graphql(json!({
        "products": {"edges": [
            {"node": {
                "id": "gid://shopify/Product/7",
                "title": "Harbour at Dusk",
                "featuredImage": {"url": "https://cdn.shopify.com/harbour.jpg"},
                "priceRangeV2": {"minVariantPrice": {"amount": "1200.0", "currencyCode": "EUR"}},
                "artist": {"value": "A. Moreau"},
                "year": null,
                "dimensions": null,
                "medium": null,
                "frame": null
            }},
            {"node": {
                "id": "gid://shopify/Product/8",
                "title": "Untitled",
                "featuredImage": null,
                "priceRangeV2": {"minVariantPrice": {"amount": "80.0", "currencyCode": "EUR"}}
            }}
        ]}
    }))
    .await;

    let response = app
        .send(api_get("/api/products", &session_token(SHOP)))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({"products": [
            {
                "id": "gid://shopify/Product/7",
                "title": "Harbour at Dusk",
                "imageUrl": "https://cdn.shopify.com/harbour.jpg",
                "price": "1200.0 EUR",
                "artist": "A. Moreau"
            },
            {
                "id": "gid://shopify/Product/8",
                "title": "Untitled",
                "price": "80.0 EUR"
            }
        ]})
    );
}

#[tokio::test]
async fn test_customers_are_proxied() {
    let app = TestApp::new().await;
    app.install().await;
    app.mock_graphql(json!({
        "customers": {"edges": [
            {"node": {
                "id": "gid://shopify/Customer/1",
                "firstName": "Mina",
                "lastName": "Ito",
                "defaultEmailAddress": {"emailAddress": "mina@example.com"}
            }},
            {"node": {
                "id": "gid://shopify/Customer/2",
                "firstName": null,
                "lastName": null,
                "defaultEmailAddress": null
            }}
        ]}
    }))
    .await;

    let response = app
        .send(api_get("/api/customers", &session_token(SHOP)))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let customers = response.json()["customers"].clone();
    assert_eq!(customers[0]["email"], "mina@example.com");
    assert_eq!(customers[0]["firstName"], "Mina");
    assert_eq!(customers[1]["email"], "");
    assert!(customers[1].get("firstName").is_none());
}

#[tokio::test]
async fn test_revoked_token_is_unauthorized() {
    let app = TestApp::new().await;
    app.install().await;
    Mock::given(method("POST"))
        .and(path(format!("/admin/api/{API_VERSION}/graphql.json")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.shopify)
        .await;

    let response = app
        .send(api_get("/api/customers", &session_token(SHOP)))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(
        response.json()["error"]
            .as_str()
            .unwrap()
            .contains("reinstall")
    );
}

#[tokio::test]
async fn test_shopify_failure_is_not_leaked() {
    let app = TestApp::new().await;
    app.install().await;
    Mock::given(method("POST"))
        .and(path(format!("/admin/api/{API_VERSION}/graphql.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Access denied for customers field"}]
        })))
        .mount(&app.shopify)
        .await;

    let response = app
        .send(api_get("/api/customers", &session_token(SHOP)))
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["error"], "Failed to fetch data from Shopify");
}
