//! Order status machine and notification triggering, driven through the
//! HTTP surface the way staff tooling and the bot actually hit it.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use tandir_core::{ChatId, DeliveryType, PaymentType, UserId};
use tandir_integration_tests::{
    RecordingChannel, seed_branch, seed_category, seed_product, seed_user, server_pool,
};
use tandir_server::checkout::{self, CheckoutRequest};
use tandir_server::config::ServerConfig;
use tandir_server::db::CartRepository;
use tandir_server::notify::OrderNotifier;
use tandir_server::state::AppState;
use tandir_server::{auth, routes};

const ACCESS_SECRET: &str = "integration-test-access-secret-0123456789";
const STAFF_TOKEN: &str = "staff-token-for-tests";

fn test_config(database_url: String) -> ServerConfig {
    ServerConfig {
        database_url,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        access_token_secret: SecretString::from(ACCESS_SECRET),
        staff_token: SecretString::from(STAFF_TOKEN),
        bot_token: None,
        utc_offset_hours: 5,
        sentry_dsn: None,
    }
}

struct TestApp {
    router: Router,
    pool: sqlx::SqlitePool,
    channel: RecordingChannel,
}

async fn test_app(dir: &tempfile::TempDir) -> TestApp {
    let pool = server_pool(dir).await;
    let channel = RecordingChannel::default();
    let notifier = OrderNotifier::new(Arc::new(channel.clone()));
    let config = test_config(format!("sqlite:{}", dir.path().join("orders.db").display()));
    let state = AppState::new(config, pool.clone(), notifier);
    let router = routes::routes().with_state(state);

    TestApp {
        router,
        pool,
        channel,
    }
}

fn bearer(user: UserId) -> String {
    let secret = SecretString::from(ACCESS_SECRET);
    let token = auth::sign_access_token(user, &secret, chrono::Duration::minutes(5)).unwrap();
    format!("Bearer {token}")
}

async fn place_order(app: &TestApp, user: UserId) -> i64 {
    let category = seed_category(&app.pool, "Lavash").await;
    let product = seed_product(&app.pool, category, "Lavash classic", 10_000).await;
    let branch = seed_branch(&app.pool, "Chilonzor", 20).await;

    CartRepository::new(&app.pool)
        .add_item(user, product, 1)
        .await
        .unwrap();

    let request = CheckoutRequest {
        delivery_type: DeliveryType::Pickup,
        address: None,
        latitude: None,
        longitude: None,
        payment_type: PaymentType::Cash,
        notes: None,
        pickup_branch_id: Some(branch),
    };
    let order = checkout::run(
        &app.pool,
        user,
        request,
        chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
    )
    .await
    .unwrap();
    order.id.as_i64()
}

async fn patch_status(app: &TestApp, order_id: i64, status: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/orders/{order_id}/status"))
        .header("x-staff-token", STAFF_TOKEN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "status": status }).to_string()))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status_code = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status_code, body)
}

#[tokio::test]
async fn status_change_notifies_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let chat = ChatId::new(555_001);
    let user = seed_user(&app.pool, chat, "+998901110001").await;
    let order_id = place_order(&app, user).await;

    let (code, body) = patch_status(&app, order_id, "preparing").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "preparing");

    let sent = app.channel.sent.lock().await;
    assert_eq!(sent.len(), 1, "exactly one notification attempt");
    assert_eq!(sent[0].0, chat);
    assert!(sent[0].1.contains(&order_id.to_string()));
    assert!(sent[0].1.contains("Tayyorlanmoqda"));
}

#[tokio::test]
async fn noop_status_write_notifies_nobody() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let user = seed_user(&app.pool, ChatId::new(555_002), "+998901110002").await;
    let order_id = place_order(&app, user).await;

    patch_status(&app, order_id, "preparing").await;
    app.channel.sent.lock().await.clear();

    let (code, _) = patch_status(&app, order_id, "preparing").await;
    assert_eq!(code, StatusCode::OK);
    assert!(app.channel.sent.lock().await.is_empty(), "no-op must not notify");
}

#[tokio::test]
async fn illegal_transitions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let user = seed_user(&app.pool, ChatId::new(555_003), "+998901110003").await;
    let order_id = place_order(&app, user).await;

    // Skipping straight to on_the_way from new is not allowed.
    let (code, body) = patch_status(&app, order_id, "on_the_way").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("cannot move"));
    assert!(app.channel.sent.lock().await.is_empty());
}

#[tokio::test]
async fn staff_endpoint_requires_the_staff_token() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let user = seed_user(&app.pool, ChatId::new(555_004), "+998901110004").await;
    let order_id = place_order(&app, user).await;

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/orders/{order_id}/status"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "status": "preparing" }).to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_cancellation_respects_the_machine() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let chat = ChatId::new(555_005);
    let user = seed_user(&app.pool, chat, "+998901110005").await;
    let order_id = place_order(&app, user).await;

    let cancel = |router: Router| async move {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/orders/{order_id}/cancel"))
            .header(header::AUTHORIZATION, bearer(user))
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    };

    let response = cancel(app.router.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Cancellation is a real status change: one notification.
    assert_eq!(app.channel.sent.lock().await.len(), 1);

    // A second cancellation finds a terminal order.
    let response = cancel(app.router.clone()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delivered_orders_cannot_be_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let user = seed_user(&app.pool, ChatId::new(555_006), "+998901110006").await;
    let order_id = place_order(&app, user).await;

    patch_status(&app, order_id, "preparing").await;
    patch_status(&app, order_id, "on_the_way").await;
    patch_status(&app, order_id, "delivered").await;
    assert_eq!(app.channel.sent.lock().await.len(), 3);

    let request = Request::builder()
        .method("POST")
        .uri(format!("/orders/{order_id}/cancel"))
        .header(header::AUTHORIZATION, bearer(user))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_are_invisible_to_other_users() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir).await;
    let alice = seed_user(&app.pool, ChatId::new(555_007), "+998901110007").await;
    let bob = seed_user(&app.pool, ChatId::new(555_008), "+998901110008").await;
    let order_id = place_order(&app, alice).await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/orders/{order_id}"))
        .header(header::AUTHORIZATION, bearer(bob))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
