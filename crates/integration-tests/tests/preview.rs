//! Public preview scenarios.

#![allow(clippy::unwrap_used)]

use std::num::NonZeroU32;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use showroom_integration_tests::{TestApp, form_post, get, get_with_cookie, json_post};

fn protected_catalog() -> Value {
    json!({
        "title": "Private viewing",
        "leadText": "Works on paper",
        "products": [
            {"id": "p1", "title": "Blue Heron", "artist": "M. Ito", "year": "1998"}
        ],
        "username": "buyer",
        "password": "open sesame"
    })
}

#[tokio::test]
async fn test_public_catalog_renders_products() {
    let app = TestApp::new().await;
    let id = app
        .create_catalog(&json!({
            "title": "Spring",
            "products": [{"id": "p1", "title": "Blue Heron", "price": "900.00 EUR"}]
        }))
        .await;

    let response = app.send(get(&format!("/preview/{id}"))).await;
    assert_eq!(response.status, StatusCode::OK);

    let html = response.text();
    assert!(html.contains("Spring"));
    assert!(html.contains("Blue Heron"));
    assert!(html.contains("900.00 EUR"));
}

#[tokio::test]
async fn test_locked_catalog_hides_products_until_unlocked() {
    let app = TestApp::new().await;
    let id = app.create_catalog(&protected_catalog()).await;

    let response = app.send(get(&format!("/preview/{id}"))).await;
    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Private viewing"));
    assert!(html.contains("name=\"password\""));
    assert!(!html.contains("Blue Heron"));

    let response = app
        .send(form_post(
            &format!("/preview/{id}/unlock"),
            &[("username", "buyer"), ("password", "wrong")],
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let html = response.text();
    assert!(html.contains("incorrect username or password"));
    assert!(!html.contains("Blue Heron"));

    let response = app
        .send(form_post(
            &format!("/preview/{id}/unlock"),
            &[("username", "buyer"), ("password", "open sesame")],
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some(format!("/preview/{id}").as_str()));
    let cookie = response.session_cookie().expect("session cookie");

    let response = app
        .send(get_with_cookie(&format!("/preview/{id}"), &cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Blue Heron"));
    assert!(html.contains("Works on paper"));

    // Another browser is still locked out
    let response = app.send(get(&format!("/preview/{id}"))).await;
    assert!(!response.text().contains("Blue Heron"));
}

#[tokio::test]
async fn test_expired_catalog_is_gone() {
    let app = TestApp::new().await;
    let yesterday = Utc::now() - Duration::days(1);
    let id = app
        .create_catalog(&json!({
            "title": "Last season",
            "products": [{"id": "p1", "title": "Blue Heron"}],
            "expiresAt": yesterday.to_rfc3339()
        }))
        .await;

    let response = app.send(get(&format!("/preview/{id}"))).await;
    assert_eq!(response.status, StatusCode::GONE);
    let html = response.text();
    assert!(html.contains("Last season"));
    assert!(!html.contains("Blue Heron"));

    let response = app.send(get(&format!("/api/preview/{id}"))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"state": "expired"}));
}

#[tokio::test]
async fn test_expired_catalog_cannot_be_unlocked() {
    let app = TestApp::new().await;
    let mut body = protected_catalog();
    body["expiresAt"] = json!((Utc::now() - Duration::hours(1)).to_rfc3339());
    let id = app.create_catalog(&body).await;

    let response = app
        .send(form_post(
            &format!("/preview/{id}/unlock"),
            &[("username", "buyer"), ("password", "open sesame")],
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::GONE);
    assert!(!response.text().contains("Blue Heron"));

    let response = app
        .send(json_post(
            &format!("/api/preview/{id}/unlock"),
            &json!({"username": "buyer", "password": "open sesame"}),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::GONE);
}

#[tokio::test]
async fn test_unlock_attempts_are_rate_limited() {
    let app = TestApp::with_config(|config| {
        config.unlock_attempts_per_minute = NonZeroU32::new(2).unwrap();
    })
    .await;
    let id = app.create_catalog(&protected_catalog()).await;
    let uri = format!("/preview/{id}/unlock");

    for _ in 0..2 {
        let response = app
            .send(form_post(&uri, &[("username", "buyer"), ("password", "guess")], None))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    // Even the right password waits out the limit
    let response = app
        .send(form_post(
            &uri,
            &[("username", "buyer"), ("password", "open sesame")],
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(!response.text().contains("Blue Heron"));
}

#[tokio::test]
async fn test_json_preview_flow() {
    let app = TestApp::new().await;
    let id = app.create_catalog(&protected_catalog()).await;

    let response = app.send(get(&format!("/api/preview/{id}"))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"state": "locked"}));

    let response = app
        .send(json_post(
            &format!("/api/preview/{id}/unlock"),
            &json!({"username": "buyer", "password": "nope"}),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .send(json_post(
            &format!("/api/preview/{id}/unlock"),
            &json!({"username": "buyer", "password": "open sesame"}),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.session_cookie().expect("session cookie");
    let body = response.json();
    assert_eq!(body["state"], "unlocked");
    assert_eq!(body["catalog"]["products"][0]["title"], "Blue Heron");
    assert!(!response.text().contains("open sesame"));

    let response = app
        .send(get_with_cookie(&format!("/api/preview/{id}"), &cookie))
        .await;
    assert_eq!(response.json()["state"], "unlocked");
}

#[tokio::test]
async fn test_unknown_preview_is_not_found() {
    let app = TestApp::new().await;

    for id in ["4b3d2a9e-7f7e-4a3c-9d0b-1c2e3f405162", "nope"] {
        let response = app.send(get(&format!("/preview/{id}"))).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let response = app.send(get(&format!("/api/preview/{id}"))).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
