//! User-facing locale.

use serde::{Deserialize, Serialize};

/// The two locales the platform speaks.
///
/// Every user-visible string exists in both; [`Locale::Uz`] is the
/// fallback when nothing has been chosen or stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Uzbek (default).
    #[default]
    Uz,
    /// Russian.
    Ru,
}

impl Locale {
    /// The language code used on the wire (`Accept-Language`, profile field).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Uz => "uz",
            Self::Ru => "ru",
        }
    }

    /// Parse a language code, falling back to the default for anything
    /// unrecognized.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "ru" => Self::Ru,
            _ => Self::Uz,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uz" => Ok(Self::Uz),
            "ru" => Ok(Self::Ru),
            _ => Err(format!("invalid locale: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_falls_back() {
        assert_eq!(Locale::from_code("ru"), Locale::Ru);
        assert_eq!(Locale::from_code("uz"), Locale::Uz);
        assert_eq!(Locale::from_code("en"), Locale::Uz);
        assert_eq!(Locale::from_code(""), Locale::Uz);
    }

    #[test]
    fn test_strict_parse() {
        assert!("en".parse::<Locale>().is_err());
        assert_eq!("ru".parse::<Locale>(), Ok(Locale::Ru));
    }
}
