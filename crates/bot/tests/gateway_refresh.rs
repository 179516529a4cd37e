//! Gateway credential-refresh behavior.
//!
//! The refresh-and-retry protocol is the one piece of automatic retry in
//! the system, so its exactly-once guarantee is pinned down here against
//! a mock backend.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tandir_bot::api::{ApiError, ApiGateway};
use tandir_bot::conversation::ConversationState;
use tandir_bot::session::{Session, SessionStore};
use tandir_core::{ChatId, CredentialPair};

const IDENTITY: ChatId = ChatId::new(990_001);

async fn store_with_credentials(dir: &tempfile::TempDir) -> SessionStore {
    let url = format!("sqlite:{}", dir.path().join("sessions.db").display());
    let store = SessionStore::open(&url).await.expect("open store");

    let mut session = Session::new(IDENTITY);
    session.locale = Some(tandir_core::Locale::Uz);
    session.credentials = Some(CredentialPair::new(
        "old-access".to_owned(),
        "refresh-1".to_owned(),
    ));
    session.state = ConversationState::MainMenu;
    store.save(&session).await.expect("save session");

    store
}

fn gateway(server: &MockServer, store: SessionStore) -> ApiGateway {
    let base = server.uri().parse().expect("mock server url");
    ApiGateway::new(reqwest::Client::new(), base, store)
}

fn profile_body() -> serde_json::Value {
    json!({ "phone": "+998901234567", "first_name": "Aziz" })
}

#[tokio::test]
async fn refresh_then_retry_succeeds_exactly_once() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_with_credentials(&dir).await;

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .and(header("Authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .and(body_partial_json(json!({"refresh": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .and(header("Authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, store.clone());
    let profile = gateway.profile(IDENTITY).await.expect("profile");
    assert_eq!(profile.phone, "+998901234567");

    // The rotated pair is persisted; the refresh token was not rotated.
    let session = store.get(IDENTITY).await.expect("get session");
    let credentials = session.credentials.expect("credentials survive");
    assert_eq!(credentials.access(), "new-access");
    assert_eq!(credentials.refresh(), "refresh-1");
}

#[tokio::test]
async fn rotated_refresh_token_is_persisted() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_with_credentials(&dir).await;

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .and(header("Authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"access": "new-access", "refresh": "refresh-2"}),
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .and(header("Authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .mount(&server)
        .await;

    let gateway = gateway(&server, store.clone());
    gateway.profile(IDENTITY).await.expect("profile");

    let session = store.get(IDENTITY).await.expect("get session");
    let credentials = session.credentials.expect("credentials survive");
    assert_eq!(credentials.refresh(), "refresh-2");
}

#[tokio::test]
async fn failed_refresh_clears_credentials() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_with_credentials(&dir).await;

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "refresh expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, store.clone());
    let err = gateway.profile(IDENTITY).await.expect_err("must fail");
    assert!(matches!(err, ApiError::Unauthorized { .. }));

    let session = store.get(IDENTITY).await.expect("get session");
    assert!(session.credentials.is_none(), "credentials must be cleared");
}

#[tokio::test]
async fn second_401_after_refresh_clears_credentials_and_stops() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_with_credentials(&dir).await;

    // Both the original and the retried request see 401; the refresh
    // itself succeeds. Exactly two profile calls, one refresh, no loop.
    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, store.clone());
    let err = gateway.profile(IDENTITY).await.expect_err("must fail");
    assert!(matches!(err, ApiError::Unauthorized { .. }));

    let session = store.get(IDENTITY).await.expect("get session");
    assert!(session.credentials.is_none(), "credentials must be cleared");
}

#[tokio::test]
async fn unauthenticated_401_is_returned_without_refresh() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite:{}", dir.path().join("sessions.db").display());
    let store = SessionStore::open(&url).await.expect("open store");

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "no token"})))
        .expect(1)
        .mount(&server)
        .await;

    // No refresh mock mounted: a refresh attempt would 404 and the
    // expect(1) above would catch a second profile call.
    let gateway = gateway(&server, store);
    let err = gateway.profile(IDENTITY).await.expect_err("must fail");
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}

#[tokio::test]
async fn taxonomy_maps_statuses() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_with_credentials(&dir).await;

    Mock::given(method("GET"))
        .and(path("/orders/55"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "not found"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/orders/checkout"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "cart is empty"})))
        .mount(&server)
        .await;

    let gateway = gateway(&server, store);

    let err = gateway
        .order_detail(IDENTITY, tandir_core::OrderId::new(55))
        .await
        .expect_err("404 expected");
    assert!(matches!(err, ApiError::NotFound { .. }));

    let submission = tandir_bot::api::types::CheckoutSubmission {
        delivery_type: tandir_core::DeliveryType::Pickup,
        address: None,
        latitude: None,
        longitude: None,
        payment_type: tandir_core::PaymentType::Cash,
        notes: None,
        pickup_branch_id: Some(tandir_core::BranchId::new(1)),
    };
    let err = gateway
        .checkout(IDENTITY, &submission)
        .await
        .expect_err("400 expected");
    match err {
        ApiError::Validation { detail, status } => {
            assert_eq!(detail, "cart is empty");
            assert_eq!(status, 400);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}
