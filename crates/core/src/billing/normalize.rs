//! Per-cycle normalization factors.
//!
//! | cycle          | monthly  | yearly |
//! |----------------|----------|--------|
//! | monthly        | ×1       | ×12    |
//! | quarterly      | ÷3       | ×4     |
//! | yearly         | ÷12      | ×1     |
//! | semi_annually  | ÷6       | ×2     |
//! | weekly         | ×4.33    | ×52    |
//! | daily          | ×30.44   | ×365   |
//!
//! Outputs are unrounded; callers round once at the end. A product that
//! overflows `Decimal` is logged and counted as zero.

use rust_decimal::Decimal;
use tracing::warn;

use super::cycle::BillingCycle;

/// Average weeks per month.
const WEEKS_PER_MONTH: Decimal = Decimal::from_parts(433, 0, 0, false, 2);
/// Average days per month.
const DAYS_PER_MONTH: Decimal = Decimal::from_parts(3044, 0, 0, false, 2);

fn warn_unknown(cycle: &BillingCycle) {
    warn!(cycle = %cycle, "Unknown billing cycle, using amount unchanged");
}

fn scale(amount: Decimal, factor: Decimal, cycle: &BillingCycle) -> Decimal {
    amount.checked_mul(factor).unwrap_or_else(|| {
        warn!(cycle = %cycle, amount = %amount, "Normalized amount overflows, treated as 0");
        Decimal::ZERO
    })
}

/// Returns the monthly equivalent of one charge.
#[must_use]
pub fn to_monthly(amount: Decimal, cycle: &BillingCycle) -> Decimal {
    match cycle {
        BillingCycle::Monthly => amount,
        BillingCycle::Quarterly => amount / Decimal::from(3),
        BillingCycle::Yearly => amount / Decimal::from(12),
        BillingCycle::SemiAnnually => amount / Decimal::from(6),
        BillingCycle::Weekly => scale(amount, WEEKS_PER_MONTH, cycle),
        BillingCycle::Daily => scale(amount, DAYS_PER_MONTH, cycle),
        BillingCycle::Unknown(_) => {
            warn_unknown(cycle);
            amount
        }
    }
}

/// Returns the yearly equivalent of one charge.
#[must_use]
pub fn to_yearly(amount: Decimal, cycle: &BillingCycle) -> Decimal {
    match cycle {
        BillingCycle::Monthly => scale(amount, Decimal::from(12), cycle),
        BillingCycle::Quarterly => scale(amount, Decimal::from(4), cycle),
        BillingCycle::Yearly => amount,
        BillingCycle::SemiAnnually => scale(amount, Decimal::from(2), cycle),
        BillingCycle::Weekly => scale(amount, Decimal::from(52), cycle),
        BillingCycle::Daily => scale(amount, Decimal::from(365), cycle),
        BillingCycle::Unknown(_) => {
            warn_unknown(cycle);
            amount
        }
    }
}

/// Returns the quarterly equivalent (three monthly amounts).
#[must_use]
pub fn to_quarterly(amount: Decimal, cycle: &BillingCycle) -> Decimal {
    scale(to_monthly(amount, cycle), Decimal::from(3), cycle)
}

/// Coerces a missing or negative stored amount to zero.
///
/// `context` identifies the row in the warning.
#[must_use]
pub fn sanitize_amount(amount: Option<Decimal>, context: &str) -> Decimal {
    match amount {
        Some(value) if value >= Decimal::ZERO => value,
        Some(value) => {
            warn!(context, amount = %value, "Negative amount treated as 0");
            Decimal::ZERO
        }
        None => {
            warn!(context, "Missing amount treated as 0");
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(BillingCycle::Monthly, dec!(120), dec!(120))]
    #[case(BillingCycle::Quarterly, dec!(120), dec!(40))]
    #[case(BillingCycle::Yearly, dec!(120), dec!(10))]
    #[case(BillingCycle::SemiAnnually, dec!(120), dec!(20))]
    #[case(BillingCycle::Weekly, dec!(10), dec!(43.30))]
    #[case(BillingCycle::Daily, dec!(1), dec!(30.44))]
    fn test_to_monthly(
        #[case] cycle: BillingCycle,
        #[case] amount: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(to_monthly(amount, &cycle), expected);
    }

    #[rstest]
    #[case(BillingCycle::Monthly, dec!(10), dec!(120))]
    #[case(BillingCycle::Quarterly, dec!(10), dec!(40))]
    #[case(BillingCycle::Yearly, dec!(10), dec!(10))]
    #[case(BillingCycle::SemiAnnually, dec!(10), dec!(20))]
    #[case(BillingCycle::Weekly, dec!(10), dec!(520))]
    #[case(BillingCycle::Daily, dec!(10), dec!(3650))]
    fn test_to_yearly(
        #[case] cycle: BillingCycle,
        #[case] amount: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(to_yearly(amount, &cycle), expected);
    }

    #[test]
    fn test_unknown_cycle_passes_through() {
        let cycle = BillingCycle::parse("biweekly");
        assert_eq!(to_monthly(dec!(15), &cycle), dec!(15));
        assert_eq!(to_yearly(dec!(15), &cycle), dec!(15));
    }

    #[test]
    fn test_to_quarterly() {
        assert_eq!(to_quarterly(dec!(30), &BillingCycle::Monthly), dec!(90));
        assert_eq!(to_quarterly(dec!(120), &BillingCycle::Yearly), dec!(30));
    }

    #[test]
    fn test_overflowing_amount_counts_as_zero() {
        let huge = Decimal::MAX / dec!(100);
        assert_eq!(to_yearly(huge, &BillingCycle::Daily), Decimal::ZERO);
        assert_eq!(to_monthly(huge, &BillingCycle::Daily), Decimal::ZERO);
        assert_eq!(to_quarterly(Decimal::MAX, &BillingCycle::Monthly), Decimal::ZERO);
        assert_eq!(to_yearly(huge, &BillingCycle::Yearly), huge);
    }

    #[test]
    fn test_sanitize_amount() {
        assert_eq!(sanitize_amount(Some(dec!(9.99)), "sub"), dec!(9.99));
        assert_eq!(sanitize_amount(Some(dec!(-1)), "sub"), Decimal::ZERO);
        assert_eq!(sanitize_amount(None, "sub"), Decimal::ZERO);
    }
}
