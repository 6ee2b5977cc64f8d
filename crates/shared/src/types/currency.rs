//! ISO 4217 currency codes.
//!
//! Subscriptions may be billed in any currency the exchange-rate provider
//! knows about, so codes are validated for shape rather than drawn from a
//! closed list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned for strings that are not three ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: {0:?}")]
pub struct InvalidCurrencyCode(pub String);

/// A normalized (upper-case) three-letter currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrencyCode` unless the trimmed input is exactly
    /// three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, InvalidCurrencyCode> {
        let trimmed = code.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(InvalidCurrencyCode(code.to_string()))
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
