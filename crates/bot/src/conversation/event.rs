//! Inbound chat events.

/// One asynchronous, stateless event from the chat transport.
///
/// Commands (`/start`, `/cancel`) arrive as [`ChatEvent::Text`] and are
/// recognized by the machine, not the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Typed text or a persistent-keyboard command.
    Text {
        text: String,
        /// Sender's display name, when the transport exposes it.
        first_name: Option<String>,
    },
    /// Inline button press carrying its opaque payload.
    Button { payload: String },
    /// Shared contact card.
    Contact {
        phone: String,
        first_name: Option<String>,
    },
    /// Shared location.
    Location { latitude: f64, longitude: f64 },
}

impl ChatEvent {
    /// Whether this event is the cancel command.
    ///
    /// Cancel wins from any state and is also routed around the normal
    /// per-identity queue by the dispatcher.
    #[must_use]
    pub fn is_cancel(&self) -> bool {
        match self {
            Self::Text { text, .. } => text.trim() == "/cancel",
            Self::Button { payload } => payload == "cancel",
            _ => false,
        }
    }

    /// Whether this event is the start/restart command.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Text { text, .. } if text.trim() == "/start")
    }
}
