//! Checkout conversation handlers.
//!
//! `AskingDeliveryType` → `AskingBranch` | `AskingLocation` →
//! `AskingPayment` → submission. The fulfillment choice rides in the
//! `AskingPayment` variant; a failed submission keeps the user there so
//! another payment press retries with the same draft.

use tandir_core::{BranchId, DeliveryType, PaymentType};

use super::{ChatEvent, Conversation, ConversationState, Fulfillment, texts, views};
use crate::api::ApiError;
use crate::api::types::CheckoutSubmission;
use crate::session::Session;
use crate::transport::OutgoingMessage;

impl Conversation {
    /// Entry from the cart view's checkout button (still `MainMenu`).
    pub(super) async fn start_checkout(&self, session: &mut Session) {
        // An empty cart never enters the checkout states.
        match self.gateway.cart(session.identity).await {
            Ok(cart) if cart.items.is_empty() => {
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::cart_empty(session.locale())),
                )
                .await;
            }
            Ok(_) => {
                session.state = ConversationState::AskingDeliveryType;
                self.send(session.identity, views::delivery_type_keyboard(session.locale()))
                    .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }

    /// `AskingDeliveryType`: delivery asks for a location, pickup for an
    /// open branch.
    pub(super) async fn on_asking_delivery_type(&self, session: &mut Session, event: ChatEvent) {
        let locale = session.locale();
        let ChatEvent::Button { payload } = event else {
            self.clarify(session).await;
            return;
        };

        match payload.as_str() {
            "checkout:delivery" => {
                session.state = ConversationState::AskingLocation;
                self.send(session.identity, views::location_request(locale)).await;
            }
            "checkout:pickup" => match self.gateway.branches(session.identity).await {
                Ok(branches) => {
                    let open: Vec<_> = branches.into_iter().filter(|b| b.is_open).collect();
                    // With no open branch the user can only cancel; the
                    // keyboard then carries nothing but the cancel button.
                    session.state = ConversationState::AskingBranch;
                    self.send(session.identity, views::branch_keyboard(locale, &open))
                        .await;
                }
                Err(e) => self.surface_error(session, &e).await,
            },
            _ => self.clarify(session).await,
        }
    }

    /// `AskingBranch`: a branch button settles pickup fulfillment.
    pub(super) async fn on_asking_branch(&self, session: &mut Session, event: ChatEvent) {
        let ChatEvent::Button { payload } = event else {
            self.clarify(session).await;
            return;
        };
        let Some(branch_id) = payload.strip_prefix("branch:").and_then(|s| s.parse().ok()) else {
            self.clarify(session).await;
            return;
        };

        session.state = ConversationState::AskingPayment {
            fulfillment: Fulfillment::Pickup {
                branch_id: BranchId::new(branch_id),
            },
        };
        self.send(session.identity, views::payment_keyboard(session.locale()))
            .await;
    }

    /// `AskingLocation`: a shared location settles delivery fulfillment.
    pub(super) async fn on_asking_location(&self, session: &mut Session, event: ChatEvent) {
        let ChatEvent::Location {
            latitude,
            longitude,
        } = event
        else {
            // Re-prompt; the reply keyboard is still on screen.
            self.send(
                session.identity,
                OutgoingMessage::text(texts::share_location_prompt(session.locale())),
            )
            .await;
            return;
        };

        session.state = ConversationState::AskingPayment {
            fulfillment: Fulfillment::Delivery {
                latitude,
                longitude,
            },
        };
        self.send(session.identity, views::payment_keyboard(session.locale()))
            .await;
    }

    /// `AskingPayment`: a payment button submits the accumulated draft.
    pub(super) async fn on_asking_payment(
        &self,
        session: &mut Session,
        event: ChatEvent,
        fulfillment: Fulfillment,
    ) {
        let locale = session.locale();
        let ChatEvent::Button { payload } = event else {
            self.clarify(session).await;
            return;
        };
        let payment_type = match payload.as_str() {
            "pay:cash" => PaymentType::Cash,
            "pay:card" => PaymentType::Card,
            _ => {
                self.clarify(session).await;
                return;
            }
        };

        let submission = build_submission(&fulfillment, payment_type);
        match self.gateway.checkout(session.identity, &submission).await {
            Ok(order) => {
                session.state = ConversationState::MainMenu;
                self.send(
                    session.identity,
                    views::main_menu(locale, &views::order_confirmation(locale, &order)),
                )
                .await;
            }
            Err(ApiError::Validation { detail, .. }) => {
                // Stay put: the draft is intact, the user can fix the
                // problem (or cancel) and press a payment button again.
                self.send(
                    session.identity,
                    OutgoingMessage::text(texts::checkout_failed(locale, &detail)),
                )
                .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }
}

fn build_submission(fulfillment: &Fulfillment, payment_type: PaymentType) -> CheckoutSubmission {
    match *fulfillment {
        Fulfillment::Pickup { branch_id } => CheckoutSubmission {
            delivery_type: DeliveryType::Pickup,
            address: None,
            latitude: None,
            longitude: None,
            payment_type,
            notes: None,
            pickup_branch_id: Some(branch_id),
        },
        Fulfillment::Delivery {
            latitude,
            longitude,
        } => CheckoutSubmission {
            delivery_type: DeliveryType::Delivery,
            address: None,
            latitude: Some(latitude),
            longitude: Some(longitude),
            payment_type,
            notes: None,
            pickup_branch_id: None,
        },
    }
}
