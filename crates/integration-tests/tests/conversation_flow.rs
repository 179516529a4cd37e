//! Conversation state machine scenarios against a mock backend and a
//! recording transport, driven through the per-identity dispatcher so
//! persistence behaves exactly as in production.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tandir_bot::api::ApiGateway;
use tandir_bot::conversation::{ChatEvent, Conversation, ConversationState, Fulfillment};
use tandir_bot::dispatcher::Dispatcher;
use tandir_bot::session::{Session, SessionStore};
use tandir_core::{BranchId, ChatId, CredentialPair, Locale, PhoneNumber};
use tandir_integration_tests::RecordingTransport;

const IDENTITY: ChatId = ChatId::new(770_001);

struct Harness {
    store: SessionStore,
    dispatcher: Dispatcher,
    transport: RecordingTransport,
    _dir: tempfile::TempDir,
}

async fn harness(server: &MockServer) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("sessions.db").display());
    let store = SessionStore::open(&url).await.unwrap();

    let gateway = ApiGateway::new(
        reqwest::Client::new(),
        server.uri().parse().unwrap(),
        store.clone(),
    );
    let transport = RecordingTransport::default();
    let conversation = Conversation::new(gateway, store.clone(), Arc::new(transport.clone()));
    let dispatcher = Dispatcher::new(conversation, store.clone());

    Harness {
        store,
        dispatcher,
        transport,
        _dir: dir,
    }
}

fn text(s: &str) -> ChatEvent {
    ChatEvent::Text {
        text: s.to_owned(),
        first_name: Some("Aziz".to_owned()),
    }
}

fn button(payload: &str) -> ChatEvent {
    ChatEvent::Button {
        payload: payload.to_owned(),
    }
}

async fn state_of(h: &Harness) -> ConversationState {
    h.store.get(IDENTITY).await.unwrap().state
}

#[tokio::test]
async fn registration_to_main_menu_scenario() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_partial_json(json!({"phone": "+998901234567"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"detail": "code sent"})))
        .expect(1)
        .mount(&server)
        .await;

    // Exactly one verification call may arrive: the well-formed code.
    Mock::given(method("POST"))
        .and(path("/auth/verify"))
        .and(body_partial_json(
            json!({"phone": "+998901234567", "code": "123456"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "access-1",
            "refresh": "refresh-1",
            "user": { "phone": "+998901234567", "first_name": "Aziz", "language_code": "uz" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server).await;

    // Fresh identity: /start asks for a language.
    h.dispatcher.dispatch(IDENTITY, text("/start")).await;
    assert_eq!(state_of(&h).await, ConversationState::SelectingLocale);

    // Locale choice persists immediately and leads to the auth prompt.
    h.dispatcher.dispatch(IDENTITY, button("lang:uz")).await;
    let session = h.store.get(IDENTITY).await.unwrap();
    assert_eq!(session.locale, Some(Locale::Uz));
    assert_eq!(session.state, ConversationState::AwaitingAuthChoice);

    h.dispatcher.dispatch(IDENTITY, button("auth:register")).await;
    assert_eq!(state_of(&h).await, ConversationState::ChoosingPhoneInputMethod);

    h.dispatcher.dispatch(IDENTITY, button("phone:manual")).await;
    assert_eq!(state_of(&h).await, ConversationState::AwaitingManualPhone);

    // A malformed number is rejected locally and the state holds.
    h.dispatcher.dispatch(IDENTITY, text("901234567")).await;
    assert_eq!(state_of(&h).await, ConversationState::AwaitingManualPhone);

    // A valid number reaches the registration endpoint; the phone rides
    // into the verification state as that variant's scratch.
    h.dispatcher.dispatch(IDENTITY, text("+998901234567")).await;
    assert_eq!(
        state_of(&h).await,
        ConversationState::AwaitingVerificationCode {
            phone: PhoneNumber::parse("+998901234567").unwrap(),
        }
    );

    // Too short and non-numeric codes never reach the backend (the
    // verify mock's expect(1) would trip).
    h.dispatcher.dispatch(IDENTITY, text("123")).await;
    h.dispatcher.dispatch(IDENTITY, text("12ab56")).await;
    assert!(matches!(
        state_of(&h).await,
        ConversationState::AwaitingVerificationCode { .. }
    ));

    // The right code mints a credential pair and opens the menu.
    h.dispatcher.dispatch(IDENTITY, text("123456")).await;
    let session = h.store.get(IDENTITY).await.unwrap();
    assert_eq!(session.state, ConversationState::MainMenu);
    let credentials = session.credentials.expect("credential pair stored");
    assert_eq!(credentials.access(), "access-1");
    assert_eq!(credentials.refresh(), "refresh-1");
}

#[tokio::test]
async fn registration_conflict_ends_the_conversation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "account already active"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server).await;
    let mut session = Session::new(IDENTITY);
    session.locale = Some(Locale::Uz);
    session.state = ConversationState::AwaitingManualPhone;
    h.store.save(&session).await.unwrap();

    h.dispatcher.dispatch(IDENTITY, text("+998901234567")).await;
    assert_eq!(state_of(&h).await, ConversationState::Ended);

    let texts = h.transport.texts().await;
    assert!(
        texts.iter().any(|t| t.contains("account already active")),
        "{texts:?}"
    );
}

#[tokio::test]
async fn cancel_wins_from_any_state_and_drops_scratch() {
    let server = MockServer::start().await;
    let h = harness(&server).await;

    let scratchy_states = [
        ConversationState::AwaitingVerificationCode {
            phone: PhoneNumber::parse("+998901234567").unwrap(),
        },
        ConversationState::AskingPayment {
            fulfillment: Fulfillment::Pickup {
                branch_id: BranchId::new(4),
            },
        },
        ConversationState::AskingLocation,
        ConversationState::MainMenu,
    ];

    for state in scratchy_states {
        let mut session = Session::new(IDENTITY);
        session.locale = Some(Locale::Ru);
        session.state = state;
        h.store.save(&session).await.unwrap();

        h.dispatcher.dispatch(IDENTITY, text("/cancel")).await;

        let session = h.store.get(IDENTITY).await.unwrap();
        // Ended carries nothing: whatever scratch the old variant held is
        // unrepresentable now.
        assert_eq!(session.state, ConversationState::Ended);
    }
}

#[tokio::test]
async fn pickup_checkout_conversation() {
    let server = MockServer::start().await;

    let cart_body = json!({
        "id": 1,
        "items": [{
            "id": 10, "product_id": 3, "product_name": "Lavash classic",
            "unit_price": 10000, "quantity": 2, "line_total": 20000
        }],
        "total_price": 20000
    });

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 4, "name": "Chilonzor", "address": "Chilonzor 9",
              "is_open": true, "avg_preparation_minutes": 20 },
            { "id": 5, "name": "Yunusobod", "address": "Yunusobod 12",
              "is_open": false, "avg_preparation_minutes": 25 }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/orders/checkout"))
        .and(body_partial_json(json!({
            "delivery_type": "pickup",
            "payment_type": "cash",
            "pickup_branch_id": 4
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 77, "status": "new", "total_price": 20000,
            "delivery_type": "pickup",
            "estimated_ready_at": "2026-08-07T12:20:00Z",
            "created_at": "2026-08-07T12:00:00Z",
            "items": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server).await;
    let mut session = Session::new(IDENTITY);
    session.locale = Some(Locale::Uz);
    session.credentials = Some(CredentialPair::new("a".to_owned(), "r".to_owned()));
    session.state = ConversationState::MainMenu;
    h.store.save(&session).await.unwrap();

    h.dispatcher.dispatch(IDENTITY, button("checkout:start")).await;
    assert_eq!(state_of(&h).await, ConversationState::AskingDeliveryType);

    h.dispatcher
        .dispatch(IDENTITY, button("checkout:pickup"))
        .await;
    assert_eq!(state_of(&h).await, ConversationState::AskingBranch);

    // Only the open branch is offered.
    {
        let sent = h.transport.sent.lock().await;
        let (_, last) = sent.last().unwrap();
        match &last.markup {
            Some(tandir_bot::transport::ReplyMarkup::Inline(rows)) => {
                let payloads: Vec<_> = rows
                    .iter()
                    .flatten()
                    .map(|b| b.payload.as_str())
                    .collect();
                assert!(payloads.contains(&"branch:4"));
                assert!(!payloads.contains(&"branch:5"));
            }
            other => panic!("expected inline keyboard, got {other:?}"),
        }
    }

    h.dispatcher.dispatch(IDENTITY, button("branch:4")).await;
    assert_eq!(
        state_of(&h).await,
        ConversationState::AskingPayment {
            fulfillment: Fulfillment::Pickup {
                branch_id: BranchId::new(4),
            },
        }
    );

    h.dispatcher.dispatch(IDENTITY, button("pay:cash")).await;
    assert_eq!(state_of(&h).await, ConversationState::MainMenu);

    let texts = h.transport.texts().await;
    let confirmation = texts.last().unwrap();
    assert!(confirmation.contains("#77"), "{confirmation}");
    assert!(confirmation.contains("12:20"), "{confirmation}");
}

#[tokio::test]
async fn failed_checkout_stays_in_payment_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders/checkout"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "branch is closed: Chilonzor"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server).await;
    let mut session = Session::new(IDENTITY);
    session.locale = Some(Locale::Uz);
    session.credentials = Some(CredentialPair::new("a".to_owned(), "r".to_owned()));
    session.state = ConversationState::AskingPayment {
        fulfillment: Fulfillment::Pickup {
            branch_id: BranchId::new(4),
        },
    };
    h.store.save(&session).await.unwrap();

    h.dispatcher.dispatch(IDENTITY, button("pay:card")).await;

    // Still in AskingPayment with the same draft; the error is surfaced.
    assert_eq!(
        state_of(&h).await,
        ConversationState::AskingPayment {
            fulfillment: Fulfillment::Pickup {
                branch_id: BranchId::new(4),
            },
        }
    );
    let texts = h.transport.texts().await;
    assert!(
        texts.iter().any(|t| t.contains("branch is closed")),
        "{texts:?}"
    );
}

#[tokio::test]
async fn location_event_moves_delivery_checkout_forward() {
    let server = MockServer::start().await;
    let h = harness(&server).await;

    let mut session = Session::new(IDENTITY);
    session.locale = Some(Locale::Ru);
    session.credentials = Some(CredentialPair::new("a".to_owned(), "r".to_owned()));
    session.state = ConversationState::AskingLocation;
    h.store.save(&session).await.unwrap();

    // Text in the location state just re-prompts.
    h.dispatcher.dispatch(IDENTITY, text("Chilonzor 9")).await;
    assert_eq!(state_of(&h).await, ConversationState::AskingLocation);

    h.dispatcher
        .dispatch(
            IDENTITY,
            ChatEvent::Location {
                latitude: 41.311,
                longitude: 69.24,
            },
        )
        .await;
    assert_eq!(
        state_of(&h).await,
        ConversationState::AskingPayment {
            fulfillment: Fulfillment::Delivery {
                latitude: 41.311,
                longitude: 69.24,
            },
        }
    );
}

#[tokio::test]
async fn unrecognized_input_is_a_noop_with_clarification() {
    let server = MockServer::start().await;
    let h = harness(&server).await;

    let mut session = Session::new(IDENTITY);
    session.locale = Some(Locale::Uz);
    session.state = ConversationState::AwaitingAuthChoice;
    h.store.save(&session).await.unwrap();

    h.dispatcher.dispatch(IDENTITY, text("hello there")).await;
    assert_eq!(state_of(&h).await, ConversationState::AwaitingAuthChoice);

    let texts = h.transport.texts().await;
    assert!(!texts.is_empty(), "a clarification must be sent");
}
