//! Core type definitions.

pub mod credential;
pub mod id;
pub mod locale;
pub mod money;
pub mod phone;
pub mod status;

pub use credential::CredentialPair;
pub use id::*;
pub use locale::Locale;
pub use money::Money;
pub use phone::{PhoneError, PhoneNumber};
pub use status::{DeliveryType, OrderStatus, PaymentType};
