//! Conversation states.
//!
//! Each state variant carries exactly the scratch data that state needs,
//! so an illegal combination (a verification code with no phone, a
//! payment step with no fulfillment choice) cannot be represented at all.
//! Changing state drops the old variant's scratch with it.

use serde::{Deserialize, Serialize};

use tandir_core::{BranchId, PhoneNumber};

/// How the order in progress will reach the customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fulfillment {
    /// Pickup at a branch chosen while it was open.
    Pickup { branch_id: BranchId },
    /// Courier delivery to shared coordinates.
    Delivery { latitude: f64, longitude: f64 },
}

/// The closed set of conversation states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationState {
    /// Waiting for a language choice.
    SelectingLocale,
    /// Unauthenticated; waiting for the user to start registration.
    AwaitingAuthChoice,
    /// Waiting for share-contact vs. manual-entry choice.
    ChoosingPhoneInputMethod,
    /// Waiting for a shared contact card.
    AwaitingPhoneShare,
    /// Waiting for a typed phone number.
    AwaitingManualPhone,
    /// Registration accepted; waiting for the one-time code.
    AwaitingVerificationCode { phone: PhoneNumber },
    /// Authenticated home state; browsing happens without leaving it.
    MainMenu,
    /// Checkout: waiting for delivery vs. pickup.
    AskingDeliveryType,
    /// Checkout: waiting for an open-branch choice.
    AskingBranch,
    /// Checkout: waiting for a shared location.
    AskingLocation,
    /// Checkout: fulfillment settled, waiting for a payment type.
    AskingPayment { fulfillment: Fulfillment },
    /// Terminal. Only the restart command leaves this state.
    #[default]
    Ended,
}

impl ConversationState {
    /// Short tag for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectingLocale => "selecting_locale",
            Self::AwaitingAuthChoice => "awaiting_auth_choice",
            Self::ChoosingPhoneInputMethod => "choosing_phone_input_method",
            Self::AwaitingPhoneShare => "awaiting_phone_share",
            Self::AwaitingManualPhone => "awaiting_manual_phone",
            Self::AwaitingVerificationCode { .. } => "awaiting_verification_code",
            Self::MainMenu => "main_menu",
            Self::AskingDeliveryType => "asking_delivery_type",
            Self::AskingBranch => "asking_branch",
            Self::AskingLocation => "asking_location",
            Self::AskingPayment { .. } => "asking_payment",
            Self::Ended => "ended",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serde_roundtrip() {
        let states = [
            ConversationState::SelectingLocale,
            ConversationState::AwaitingVerificationCode {
                phone: PhoneNumber::parse("+998901234567").unwrap(),
            },
            ConversationState::AskingPayment {
                fulfillment: Fulfillment::Pickup {
                    branch_id: BranchId::new(3),
                },
            },
            ConversationState::Ended,
        ];

        for state in states {
            let json = serde_json::to_string(&state).unwrap();
            let back: ConversationState = serde_json::from_str(&json).unwrap();
            assert_eq!(back, state);
        }
    }

    #[test]
    fn test_default_is_ended() {
        assert_eq!(ConversationState::default(), ConversationState::Ended);
    }
}
