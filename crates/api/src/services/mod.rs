//! Request orchestration between repositories, core engines and caches.

pub mod dashboard;
pub mod jobs;
pub mod rates;
pub mod reports;

use subtrack_shared::AppError;
use subtrack_shared::types::CurrencyCode;

/// Parses an optional requested currency, falling back to `default`.
pub(crate) fn target_currency(requested: Option<&str>, default: &str) -> Result<CurrencyCode, AppError> {
    let raw = requested.filter(|s| !s.trim().is_empty()).unwrap_or(default);
    CurrencyCode::parse(raw).map_err(|e| AppError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_currency_defaults_and_normalizes() {
        assert_eq!(target_currency(None, "CNY").unwrap().as_str(), "CNY");
        assert_eq!(target_currency(Some(" "), "CNY").unwrap().as_str(), "CNY");
        assert_eq!(target_currency(Some("usd"), "CNY").unwrap().as_str(), "USD");
        assert!(matches!(
            target_currency(Some("dollars"), "CNY"),
            Err(AppError::Validation(_))
        ));
    }
}
