//! Property-based tests for cycle normalization.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::{BillingCycle, to_monthly, to_yearly};
use crate::currency::round_money;

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Yearly charges spread evenly over twelve months.
    #[test]
    fn prop_yearly_to_monthly_is_twelfth(amount in amount()) {
        prop_assert_eq!(
            to_monthly(amount, &BillingCycle::Yearly),
            amount / Decimal::from(12)
        );
    }

    /// Monthly normalized then scaled back to a year matches to_yearly.
    #[test]
    fn prop_monthly_round_trip(amount in amount()) {
        let monthly = to_monthly(amount, &BillingCycle::Monthly);
        prop_assert_eq!(monthly, amount);
        prop_assert_eq!(monthly * Decimal::from(12), to_yearly(amount, &BillingCycle::Monthly));
    }

    /// Quarterly and semi-annual cycles agree between the monthly and yearly views.
    #[test]
    fn prop_monthly_times_twelve_matches_yearly(amount in amount()) {
        for cycle in [BillingCycle::Quarterly, BillingCycle::SemiAnnually, BillingCycle::Yearly] {
            let via_monthly = round_money(to_monthly(amount, &cycle) * Decimal::from(12));
            prop_assert_eq!(via_monthly, round_money(to_yearly(amount, &cycle)));
        }
    }
}
