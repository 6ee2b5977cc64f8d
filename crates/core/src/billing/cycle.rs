//! Billing cycle enumeration.

use serde::{Deserialize, Serialize};

/// How often a subscription is charged.
///
/// Unknown strings are preserved so a row with an unexpected cycle is still
/// counted (at face value) instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillingCycle {
    /// Every calendar month.
    Monthly,
    /// Every three months.
    Quarterly,
    /// Every year.
    Yearly,
    /// Every six months.
    SemiAnnually,
    /// Every week.
    Weekly,
    /// Every day.
    Daily,
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl BillingCycle {
    /// Parses a stored cycle string. Matching is case-insensitive.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" => Self::Monthly,
            "quarterly" => Self::Quarterly,
            "yearly" | "annually" => Self::Yearly,
            "semi_annually" | "semi-annually" | "semiannually" => Self::SemiAnnually,
            "weekly" => Self::Weekly,
            "daily" => Self::Daily,
            _ => Self::Unknown(value.to_string()),
        }
    }

    /// Returns the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::SemiAnnually => "semi_annually",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
            Self::Unknown(raw) => raw,
        }
    }

    /// Returns true for cycles outside the known set.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for BillingCycle {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for BillingCycle {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<BillingCycle> for String {
    fn from(value: BillingCycle) -> Self {
        value.as_str().to_string()
    }
}
