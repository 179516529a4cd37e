//! The conversation state machine.
//!
//! A finite-state driver over chat events. Each event is dispatched to a
//! handler for the session's current state; handlers call the API gateway,
//! send outbound messages, and mutate the session. The dispatcher persists
//! the session after the handler returns, so a handler never needs to -
//! with one exception: a locale choice is saved immediately, before the
//! fire-and-forget backend profile sync.
//!
//! Wording policy: this layer is the only place that turns tagged gateway
//! results into user-visible text and state transitions (`texts`/`views`
//! hold the strings; the decisions are made here).

mod auth;
mod browse;
mod checkout;
mod event;
mod state;
mod texts;
mod views;

pub use event::ChatEvent;
pub use state::{ConversationState, Fulfillment};

use std::sync::Arc;

use tandir_core::ChatId;

use crate::api::{ApiError, ApiGateway};
use crate::session::{Session, SessionStore};
use crate::transport::{ChatTransport, OutgoingMessage};

/// The conversation driver, shared by all identities.
#[derive(Clone)]
pub struct Conversation {
    gateway: ApiGateway,
    sessions: SessionStore,
    transport: Arc<dyn ChatTransport>,
}

impl Conversation {
    /// Create the driver.
    #[must_use]
    pub fn new(
        gateway: ApiGateway,
        sessions: SessionStore,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            gateway,
            sessions,
            transport,
        }
    }

    /// Process one event against the session.
    ///
    /// Never fails outward: every gateway and transport error is resolved
    /// here into wording and a state decision. The caller persists the
    /// session afterwards.
    pub async fn handle(&self, session: &mut Session, event: ChatEvent) {
        tracing::debug!(
            identity = %session.identity,
            state = session.state.name(),
            "handling event"
        );

        // Cancel and restart win over whatever state we are in.
        if event.is_cancel() {
            self.cancel(session).await;
            return;
        }
        if event.is_start() {
            self.start(session).await;
            return;
        }

        match session.state.clone() {
            ConversationState::SelectingLocale => self.on_selecting_locale(session, event).await,
            ConversationState::AwaitingAuthChoice => {
                self.on_awaiting_auth_choice(session, event).await;
            }
            ConversationState::ChoosingPhoneInputMethod => {
                self.on_choosing_phone_method(session, event).await;
            }
            ConversationState::AwaitingPhoneShare => {
                self.on_awaiting_phone_share(session, event).await;
            }
            ConversationState::AwaitingManualPhone => {
                self.on_awaiting_manual_phone(session, event).await;
            }
            ConversationState::AwaitingVerificationCode { phone } => {
                self.on_awaiting_verification_code(session, event, phone)
                    .await;
            }
            ConversationState::MainMenu => self.on_main_menu(session, event).await,
            ConversationState::AskingDeliveryType => {
                self.on_asking_delivery_type(session, event).await;
            }
            ConversationState::AskingBranch => self.on_asking_branch(session, event).await,
            ConversationState::AskingLocation => self.on_asking_location(session, event).await,
            ConversationState::AskingPayment { fulfillment } => {
                self.on_asking_payment(session, event, fulfillment).await;
            }
            ConversationState::Ended => self.on_ended(session).await,
        }
    }

    /// Cancel from any state: terminal, scratch gone with the old variant.
    pub async fn cancel(&self, session: &mut Session) {
        session.state = ConversationState::Ended;
        self.send(session.identity, OutgoingMessage::text(texts::cancelled(session.locale())))
            .await;
    }

    /// Start resolution: stored locale and credentials decide the state.
    async fn start(&self, session: &mut Session) {
        if session.locale.is_none() {
            session.state = ConversationState::SelectingLocale;
            self.send(session.identity, views::locale_keyboard()).await;
            return;
        }
        self.check_auth_and_proceed(session).await;
    }

    /// Authenticated users land in the main menu, everyone else at the
    /// registration prompt. Verifies stored credentials against the
    /// profile endpoint (which also refreshes them if needed).
    async fn check_auth_and_proceed(&self, session: &mut Session) {
        let locale = session.locale();

        if session.is_authenticated() {
            match self.gateway.profile(session.identity).await {
                Ok(profile) => {
                    self.sync_locale(session, profile.language_code.as_deref())
                        .await;
                    session.state = ConversationState::MainMenu;
                    self.send(
                        session.identity,
                        views::main_menu(session.locale(), texts::main_menu_title(session.locale())),
                    )
                    .await;
                    return;
                }
                Err(ApiError::Unauthorized { .. }) => {
                    // The gateway has already cleared the stored pair.
                    session.credentials = None;
                }
                Err(e) if e.is_transient() => {
                    self.send(
                        session.identity,
                        OutgoingMessage::text(texts::try_again_later(locale)),
                    )
                    .await;
                    return;
                }
                Err(e) => {
                    tracing::warn!(identity = %session.identity, error = %e, "profile check failed");
                    self.send(
                        session.identity,
                        OutgoingMessage::text(texts::try_again_later(locale)),
                    )
                    .await;
                    return;
                }
            }
        }

        session.state = ConversationState::AwaitingAuthChoice;
        self.send(session.identity, views::auth_prompt(locale)).await;
    }

    /// Reconcile the session locale with the backend profile's.
    ///
    /// The backend value wins when present; otherwise the session's choice
    /// is pushed upstream fire-and-forget.
    async fn sync_locale(&self, session: &mut Session, backend_code: Option<&str>) {
        match backend_code {
            Some(code) => {
                let backend_locale = tandir_core::Locale::from_code(code);
                if session.locale != Some(backend_locale) {
                    session.locale = Some(backend_locale);
                    self.persist(session).await;
                }
            }
            None => {
                if let Some(locale) = session.locale
                    && let Err(e) = self
                        .gateway
                        .update_profile_locale(session.identity, locale)
                        .await
                {
                    tracing::warn!(identity = %session.identity, error = %e, "failed to push locale to backend");
                }
            }
        }
    }

    /// Terminal state: everything except restart gets a pointer to it.
    async fn on_ended(&self, session: &Session) {
        self.send(
            session.identity,
            OutgoingMessage::text(texts::press_start(session.locale())),
        )
        .await;
    }

    /// Unrecognized input: no-op transition plus a clarification.
    async fn clarify(&self, session: &Session) {
        self.send(
            session.identity,
            OutgoingMessage::text(texts::clarification(session.locale())),
        )
        .await;
    }

    /// Shared handling for gateway failures that should not move the
    /// state: transient errors ask to retry, an expired session ends the
    /// conversation and forces re-authentication.
    async fn surface_error(&self, session: &mut Session, error: &ApiError) {
        let locale = session.locale();
        match error {
            ApiError::Unauthorized { .. } => {
                session.credentials = None;
                session.state = ConversationState::Ended;
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::session_expired(locale)),
                )
                .await;
            }
            e if e.is_transient() => {
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::try_again_later(locale)),
                )
                .await;
            }
            e => {
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::error_detail(locale, e.detail())),
                )
                .await;
            }
        }
    }

    /// Best-effort send; a transport failure never derails the machine.
    async fn send(&self, identity: ChatId, message: OutgoingMessage) {
        if let Err(e) = self.transport.send_message(identity, message).await {
            tracing::warn!(%identity, error = %e, "failed to send message");
        }
    }

    /// Persist the session mid-handler (locale choices must not wait).
    async fn persist(&self, session: &Session) {
        if let Err(e) = self.sessions.save(session).await {
            tracing::error!(identity = %session.identity, error = %e, "failed to persist session");
        }
    }
}
