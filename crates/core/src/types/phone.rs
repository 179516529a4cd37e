//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input does not start with the +998 country prefix.
    #[error("phone number must start with +998")]
    MissingCountryPrefix,
    /// The subscriber part is not exactly nine digits.
    #[error("phone number must be +998 followed by 9 digits")]
    InvalidSubscriberPart,
}

/// An Uzbek phone number in fixed-length international format.
///
/// ## Constraints
///
/// - Must start with the `+998` country prefix
/// - Followed by exactly nine ASCII digits (`+998901234567` is 13 chars)
///
/// ## Examples
///
/// ```
/// use tandir_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("+998901234567").is_ok());
/// assert!(PhoneNumber::parse("998901234567").is_err());  // missing +
/// assert!(PhoneNumber::parse("+99890123456").is_err());  // too short
/// assert!(PhoneNumber::parse("+9989012345678").is_err()); // too long
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Country prefix for the single supported country.
    pub const COUNTRY_PREFIX: &'static str = "+998";

    /// Number of subscriber digits after the country prefix.
    pub const SUBSCRIBER_DIGITS: usize = 9;

    /// Parse a `PhoneNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, does not carry the `+998`
    /// prefix, or the subscriber part is not exactly nine digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let rest = s
            .strip_prefix(Self::COUNTRY_PREFIX)
            .ok_or(PhoneError::MissingCountryPrefix)?;

        if rest.len() != Self::SUBSCRIBER_DIGITS || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneError::InvalidSubscriberPart);
        }

        Ok(Self(s.to_owned()))
    }

    /// Parse a phone number shared from a contact card.
    ///
    /// Contact cards may omit the leading `+`; it is restored before the
    /// normal validation runs.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::parse`] after normalization.
    pub fn parse_contact(s: &str) -> Result<Self, PhoneError> {
        if s.starts_with('+') {
            Self::parse(s)
        } else {
            Self::parse(&format!("+{s}"))
        }
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(PhoneNumber::parse("+998901234567").is_ok());
        assert!(PhoneNumber::parse("+998000000000").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(PhoneNumber::parse(""), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_missing_prefix() {
        assert!(matches!(
            PhoneNumber::parse("998901234567"),
            Err(PhoneError::MissingCountryPrefix)
        ));
        assert!(matches!(
            PhoneNumber::parse("+7901234567"),
            Err(PhoneError::MissingCountryPrefix)
        ));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            PhoneNumber::parse("+99890123456"),
            Err(PhoneError::InvalidSubscriberPart)
        ));
        assert!(matches!(
            PhoneNumber::parse("+9989012345678"),
            Err(PhoneError::InvalidSubscriberPart)
        ));
    }

    #[test]
    fn test_parse_non_digit() {
        assert!(matches!(
            PhoneNumber::parse("+99890123456a"),
            Err(PhoneError::InvalidSubscriberPart)
        ));
    }

    #[test]
    fn test_parse_contact_normalizes_plus() {
        let phone = PhoneNumber::parse_contact("998901234567").unwrap();
        assert_eq!(phone.as_str(), "+998901234567");

        let phone = PhoneNumber::parse_contact("+998901234567").unwrap();
        assert_eq!(phone.as_str(), "+998901234567");
    }
}
