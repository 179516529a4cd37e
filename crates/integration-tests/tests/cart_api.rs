//! Cart HTTP surface: merge semantics, validation, and ownership, as the
//! bot's gateway client sees them.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use tandir_core::{ChatId, UserId};
use tandir_integration_tests::{
    RecordingChannel, seed_category, seed_product, seed_user, server_pool,
};
use tandir_server::config::ServerConfig;
use tandir_server::notify::OrderNotifier;
use tandir_server::state::AppState;
use tandir_server::{auth, routes};

const ACCESS_SECRET: &str = "integration-test-access-secret-0123456789";

async fn test_router(dir: &tempfile::TempDir) -> (Router, sqlx::SqlitePool) {
    let pool = server_pool(dir).await;
    let config = ServerConfig {
        database_url: format!("sqlite:{}", dir.path().join("orders.db").display()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        access_token_secret: SecretString::from(ACCESS_SECRET),
        staff_token: SecretString::from("staff-token-for-tests"),
        bot_token: None,
        utc_offset_hours: 5,
        sentry_dsn: None,
    };
    let notifier = OrderNotifier::new(Arc::new(RecordingChannel::default()));
    let state = AppState::new(config, pool.clone(), notifier);
    (routes::routes().with_state(state), pool)
}

fn bearer(user: UserId) -> String {
    let secret = SecretString::from(ACCESS_SECRET);
    let token = auth::sign_access_token(user, &secret, chrono::Duration::minutes(5)).unwrap();
    format!("Bearer {token}")
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    user: UserId,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(user));
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn add_merges_and_totals_follow() {
    let dir = tempfile::tempdir().unwrap();
    let (router, pool) = test_router(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let category = seed_category(&pool, "Lavash").await;
    let product = seed_product(&pool, category, "Lavash classic", 10_000).await;

    let body = json!({ "product_id": product, "quantity": 2 });
    let (status, cart) = call(&router, Method::POST, "/cart", user, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_price"], 20_000);

    // Same product again: one line, accumulated quantity.
    let (_, cart) = call(&router, Method::POST, "/cart", user, Some(body)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 4);
    assert_eq!(cart["total_price"], 40_000);
}

#[tokio::test]
async fn zero_quantity_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let (router, pool) = test_router(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let category = seed_category(&pool, "Lavash").await;
    let product = seed_product(&pool, category, "Lavash classic", 10_000).await;

    let body = json!({ "product_id": product, "quantity": 0 });
    let (status, body) = call(&router, Method::POST, "/cart", user, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("quantity"));
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (router, pool) = test_router(&dir).await;
    let user = seed_user(&pool, ChatId::new(1), "+998901110001").await;

    let body = json!({ "product_id": 9999, "quantity": 1 });
    let (status, _) = call(&router, Method::POST, "/cart", user, Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_users_lines_look_missing() {
    let dir = tempfile::tempdir().unwrap();
    let (router, pool) = test_router(&dir).await;
    let alice = seed_user(&pool, ChatId::new(1), "+998901110001").await;
    let bob = seed_user(&pool, ChatId::new(2), "+998901110002").await;
    let category = seed_category(&pool, "Lavash").await;
    let product = seed_product(&pool, category, "Lavash classic", 10_000).await;

    let body = json!({ "product_id": product, "quantity": 1 });
    let (_, cart) = call(&router, Method::POST, "/cart", alice, Some(body)).await;
    let item_id = cart["items"][0]["id"].as_i64().unwrap();

    let (status, _) = call(
        &router,
        Method::PATCH,
        &format!("/cart/items/{item_id}"),
        bob,
        Some(json!({ "quantity": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob sees an empty cart, never Alice's contents.
    let (_, bob_cart) = call(&router, Method::GET, "/cart", bob, None).await;
    assert!(bob_cart["items"].as_array().unwrap().is_empty());

    // Alice's line is untouched.
    let (_, alice_cart) = call(&router, Method::GET, "/cart", alice, None).await;
    assert_eq!(alice_cart["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _pool) = test_router(&dir).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/cart")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
