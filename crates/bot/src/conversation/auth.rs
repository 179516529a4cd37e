//! Locale selection, registration, and verification handlers.

use tandir_core::{Locale, PhoneNumber};

use super::{ChatEvent, Conversation, ConversationState, texts, views};
use crate::api::ApiError;
use crate::api::types::{RegisterRequest, VerifyRequest};
use crate::session::Session;
use crate::transport::OutgoingMessage;

impl Conversation {
    /// `SelectingLocale`: a language button resolves to the auth prompt or
    /// straight to the main menu.
    pub(super) async fn on_selecting_locale(&self, session: &mut Session, event: ChatEvent) {
        let ChatEvent::Button { payload } = event else {
            self.clarify(session).await;
            return;
        };
        let locale = match payload.as_str() {
            "lang:uz" => Locale::Uz,
            "lang:ru" => Locale::Ru,
            _ => {
                self.clarify(session).await;
                return;
            }
        };

        session.locale = Some(locale);
        // The choice must survive even if the rest of this handler fails.
        self.persist(session).await;

        if session.is_authenticated()
            && let Err(e) = self
                .gateway
                .update_profile_locale(session.identity, locale)
                .await
        {
            tracing::warn!(identity = %session.identity, error = %e, "failed to push locale to backend");
        }

        self.send(
            session.identity,
            OutgoingMessage::text(texts::locale_chosen(locale)),
        )
        .await;
        self.check_auth_and_proceed(session).await;
    }

    /// `AwaitingAuthChoice`: only the register button moves forward.
    pub(super) async fn on_awaiting_auth_choice(&self, session: &mut Session, event: ChatEvent) {
        match event {
            ChatEvent::Button { payload } if payload == "auth:register" => {
                session.state = ConversationState::ChoosingPhoneInputMethod;
                self.send(session.identity, views::phone_method_keyboard(session.locale()))
                    .await;
            }
            _ => self.clarify(session).await,
        }
    }

    /// `ChoosingPhoneInputMethod`: share-contact or manual entry.
    pub(super) async fn on_choosing_phone_method(&self, session: &mut Session, event: ChatEvent) {
        let locale = session.locale();
        match event {
            ChatEvent::Button { payload } if payload == "phone:share" => {
                session.state = ConversationState::AwaitingPhoneShare;
                self.send(session.identity, views::contact_request(locale)).await;
            }
            ChatEvent::Button { payload } if payload == "phone:manual" => {
                session.state = ConversationState::AwaitingManualPhone;
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::manual_phone_prompt(locale)),
                )
                .await;
            }
            _ => self.clarify(session).await,
        }
    }

    /// `AwaitingPhoneShare`: a contact card carries the number.
    pub(super) async fn on_awaiting_phone_share(&self, session: &mut Session, event: ChatEvent) {
        let ChatEvent::Contact { phone, first_name } = event else {
            self.clarify(session).await;
            return;
        };

        match PhoneNumber::parse_contact(&phone) {
            Ok(phone) => self.register(session, phone, first_name).await,
            Err(_) => {
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::invalid_phone(session.locale())),
                )
                .await;
            }
        }
    }

    /// `AwaitingManualPhone`: typed number, validated before any backend
    /// call; a bad format re-prompts in place.
    pub(super) async fn on_awaiting_manual_phone(&self, session: &mut Session, event: ChatEvent) {
        let ChatEvent::Text { text, first_name } = event else {
            self.clarify(session).await;
            return;
        };

        match PhoneNumber::parse(text.trim()) {
            Ok(phone) => self.register(session, phone, first_name).await,
            Err(_) => {
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::invalid_phone(session.locale())),
                )
                .await;
            }
        }
    }

    /// Call the registration endpoint and advance to code entry.
    async fn register(&self, session: &mut Session, phone: PhoneNumber, first_name: Option<String>) {
        let locale = session.locale();
        let request = RegisterRequest {
            chat_id: session.identity.as_i64(),
            phone: phone.as_str().to_owned(),
            first_name: first_name.unwrap_or_default(),
            last_name: None,
        };

        match self.gateway.register(session.identity, &request).await {
            Ok(()) => {
                session.state = ConversationState::AwaitingVerificationCode { phone };
                self.send(session.identity, OutgoingMessage::text(texts::otp_prompt(locale)))
                    .await;
            }
            Err(ApiError::Validation { detail, .. }) => {
                // Already-active account or identity collision: the
                // conversation ends; scratch dies with the state change.
                session.state = ConversationState::Ended;
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::registration_failed(locale, &detail)),
                )
                .await;
            }
            Err(e) if e.is_transient() => {
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::try_again_later(locale)),
                )
                .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }

    /// `AwaitingVerificationCode`: 4-6 digits or the backend is never
    /// called. Success stores the credential pair and opens the menu.
    pub(super) async fn on_awaiting_verification_code(
        &self,
        session: &mut Session,
        event: ChatEvent,
        phone: PhoneNumber,
    ) {
        let locale = session.locale();
        let ChatEvent::Text { text, .. } = event else {
            self.clarify(session).await;
            return;
        };

        let code = text.trim();
        if !(4..=6).contains(&code.len()) || !code.bytes().all(|b| b.is_ascii_digit()) {
            self.send(session.identity, OutgoingMessage::text(texts::invalid_otp(locale)))
                .await;
            return;
        }

        let request = VerifyRequest {
            phone: phone.as_str().to_owned(),
            code: code.to_owned(),
        };
        match self.gateway.verify(session.identity, &request).await {
            Ok(response) => {
                session.credentials = Some(tandir_core::CredentialPair::new(
                    response.access,
                    response.refresh,
                ));
                session.state = ConversationState::MainMenu;
                self.persist(session).await;
                self.sync_locale(session, response.user.language_code.as_deref())
                    .await;

                self.send(
                    session.identity,
                    views::main_menu(session.locale(), texts::welcome(session.locale())),
                )
                .await;
            }
            Err(ApiError::Validation { .. }) => {
                self.send(session.identity, OutgoingMessage::text(texts::wrong_code(locale)))
                    .await;
            }
            Err(e) if e.is_transient() => {
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::try_again_later(locale)),
                )
                .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }
}
