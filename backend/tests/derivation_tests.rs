//! Derivation engine tests
//!
//! Covers the invoice financial derivations:
//! - line total formulas for purchases and sales
//! - the cash-cutting and commission/packaging chains
//! - due balances and remaining lot quantities
//! - monotonicity and identity properties

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::derivation::{
    cash_cutting, due_amount, invoice_net_total, net_total_after_cash_cutting,
    net_total_after_commission, net_total_after_packaging, packaging_total, purchase_line_total,
    remaining_quantity, round_money, sales_line_total, DerivationError,
};
use shared::types::RottenPolicy;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Worked example: 100 kg at 10.00 with 2% damage, 1% discount and a
    /// 50 loading charge
    #[test]
    fn test_purchase_line_worked_example() {
        let total = purchase_line_total(
            dec("100"),
            dec("10.00"),
            dec("2"),
            dec("1"),
            Decimal::ZERO,
            dec("50"),
            RottenPolicy::Recorded,
        )
        .unwrap();

        // 100 x 10.00 = 1000, x 0.98 = 980, x 0.99 = 970.20, + 50
        assert_eq!(total, dec("1020.20"));
    }

    /// Damage and discount are successive reductions, not additive
    #[test]
    fn test_percentage_reductions_compound() {
        let total = purchase_line_total(
            dec("100"),
            dec("10"),
            dec("50"),
            dec("50"),
            Decimal::ZERO,
            Decimal::ZERO,
            RottenPolicy::Recorded,
        )
        .unwrap();

        // 1000 x 0.5 x 0.5 = 250, not 1000 x (1 - 1.0) = 0
        assert_eq!(total, dec("250"));
    }

    /// Rotten weight is recorded but not deducted under the default policy
    #[test]
    fn test_rotten_recorded_by_default() {
        let total = sales_line_total(
            dec("200"),
            dec("40"),
            Decimal::ZERO,
            dec("12"),
            RottenPolicy::Recorded,
        )
        .unwrap();
        assert_eq!(total, dec("8000"));
    }

    /// The alternate policy deducts rotten weight at the line price
    #[test]
    fn test_rotten_deducted_policy() {
        let total = sales_line_total(
            dec("200"),
            dec("40"),
            Decimal::ZERO,
            dec("12"),
            RottenPolicy::Deducted,
        )
        .unwrap();
        // 8000 - 12 x 40 = 7520
        assert_eq!(total, dec("7520"));
    }

    /// Worked example: two lines totaling 5000.00, 10% commission,
    /// 20 crates at 15.00
    #[test]
    fn test_sales_invoice_chain_worked_example() {
        let lines = vec![dec("3000.00"), dec("2000.00")];
        let net_total = invoice_net_total(&lines).unwrap();
        assert_eq!(net_total, dec("5000.00"));

        let after_commission = net_total_after_commission(net_total, dec("0.10"));
        assert_eq!(after_commission, dec("5500.00"));

        let packaging = packaging_total(20, dec("15.00"));
        assert_eq!(packaging, dec("300.00"));

        let after_packaging = net_total_after_packaging(after_commission, packaging);
        assert_eq!(after_packaging, dec("5800.00"));
    }

    /// The standard 2% cash cutting on purchase invoices
    #[test]
    fn test_cash_cutting() {
        assert_eq!(cash_cutting(dec("1000"), dec("0.02")), dec("20"));
        assert_eq!(
            net_total_after_cash_cutting(dec("1000"), dec("0.02")),
            dec("980")
        );
    }

    /// An invoice with no lines nets to zero
    #[test]
    fn test_empty_invoice_nets_zero() {
        assert_eq!(invoice_net_total(&[]).unwrap(), Decimal::ZERO);
    }

    /// A negative line total is an error, not a silent correction
    #[test]
    fn test_negative_line_total_rejected() {
        let result = invoice_net_total(&[dec("10"), dec("-1")]);
        assert_eq!(result.unwrap_err(), DerivationError::NegativeLineTotal);
    }

    /// Invalid percentages are rejected
    #[test]
    fn test_percent_out_of_range_rejected() {
        let result = sales_line_total(
            dec("10"),
            dec("10"),
            dec("100.5"),
            Decimal::ZERO,
            RottenPolicy::Recorded,
        );
        assert_eq!(
            result.unwrap_err(),
            DerivationError::PercentOutOfRange("discount_percent")
        );
    }

    /// Negative quantities are rejected
    #[test]
    fn test_negative_inputs_rejected() {
        let result = sales_line_total(
            dec("-5"),
            dec("10"),
            Decimal::ZERO,
            Decimal::ZERO,
            RottenPolicy::Recorded,
        );
        assert_eq!(result.unwrap_err(), DerivationError::Negative("net_weight"));
    }

    /// Overpayment surfaces as a negative due, never clamped
    #[test]
    fn test_overpayment_not_clamped() {
        assert_eq!(due_amount(dec("500"), dec("650")), dec("-150"));
    }

    /// Remaining stock identities
    #[test]
    fn test_remaining_quantity() {
        assert_eq!(remaining_quantity(dec("120"), dec("120")), Decimal::ZERO);
        assert_eq!(remaining_quantity(dec("120"), Decimal::ZERO), dec("120"));
    }

    /// Rounding is half away from zero at two decimal places
    #[test]
    fn test_round_money() {
        assert_eq!(round_money(dec("12.344")), dec("12.34"));
        assert_eq!(round_money(dec("12.345")), dec("12.35"));
        assert_eq!(round_money(dec("12.346")), dec("12.35"));
        assert_eq!(round_money(dec("-12.345")), dec("-12.35"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for weights in kg (0.1 to 1000.0)
    fn weight_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Strategy for unit prices (0.01 to 1000.00)
    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for percentages (0.00 to 100.00)
    fn percent_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for monetary amounts (0.00 to 100000.00)
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10000000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Sales line total is monotonically non-decreasing in net weight
        #[test]
        fn prop_sales_line_monotone_in_weight(
            weight in weight_strategy(),
            extra in weight_strategy(),
            price in price_strategy(),
            discount in percent_strategy()
        ) {
            let smaller = sales_line_total(
                weight, price, discount, Decimal::ZERO, RottenPolicy::Recorded,
            ).unwrap();
            let larger = sales_line_total(
                weight + extra, price, discount, Decimal::ZERO, RottenPolicy::Recorded,
            ).unwrap();

            prop_assert!(larger >= smaller);
        }

        /// Sales line total is monotonically non-decreasing in price
        #[test]
        fn prop_sales_line_monotone_in_price(
            weight in weight_strategy(),
            price in price_strategy(),
            extra in price_strategy(),
            discount in percent_strategy()
        ) {
            let cheaper = sales_line_total(
                weight, price, discount, Decimal::ZERO, RottenPolicy::Recorded,
            ).unwrap();
            let dearer = sales_line_total(
                weight, price + extra, discount, Decimal::ZERO, RottenPolicy::Recorded,
            ).unwrap();

            prop_assert!(dearer >= cheaper);
        }

        /// Sales line total is non-increasing in the discount percentage
        #[test]
        fn prop_sales_line_non_increasing_in_discount(
            weight in weight_strategy(),
            price in price_strategy(),
            d1 in percent_strategy(),
            d2 in percent_strategy()
        ) {
            let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };

            let less_discounted = sales_line_total(
                weight, price, lo, Decimal::ZERO, RottenPolicy::Recorded,
            ).unwrap();
            let more_discounted = sales_line_total(
                weight, price, hi, Decimal::ZERO, RottenPolicy::Recorded,
            ).unwrap();

            prop_assert!(more_discounted <= less_discounted);
        }

        /// The invoice net total equals the sum of its line totals
        #[test]
        fn prop_net_total_is_line_sum(
            lines in prop::collection::vec(amount_strategy(), 0..12)
        ) {
            let expected: Decimal = lines.iter().sum();
            prop_assert_eq!(invoice_net_total(&lines).unwrap(), expected);
        }

        /// Due plus payments reconstructs the total exactly
        #[test]
        fn prop_due_identity(
            total in amount_strategy(),
            payments in prop::collection::vec(amount_strategy(), 0..8)
        ) {
            let paid: Decimal = payments.iter().sum();
            prop_assert_eq!(due_amount(total, paid) + paid, total);
        }

        /// Cash cutting never increases the payable total
        #[test]
        fn prop_cash_cutting_never_increases(
            net in amount_strategy(),
            rate_bps in 0i64..=10000i64
        ) {
            let rate = Decimal::new(rate_bps, 4); // 0.0000 to 1.0000
            prop_assert!(net_total_after_cash_cutting(net, rate) <= net);
        }

        /// Commission never decreases the receivable total
        #[test]
        fn prop_commission_never_decreases(
            net in amount_strategy(),
            rate_bps in 0i64..=10000i64
        ) {
            let rate = Decimal::new(rate_bps, 4);
            prop_assert!(net_total_after_commission(net, rate) >= net);
        }

        /// Remaining quantity of a fully sold lot is zero
        #[test]
        fn prop_fully_sold_lot_has_nothing_left(quantity in weight_strategy()) {
            prop_assert_eq!(remaining_quantity(quantity, quantity), Decimal::ZERO);
        }

        /// Rounding moves a value by strictly less than one cent
        #[test]
        fn prop_rounding_error_bounded(value in amount_strategy()) {
            let rounded = round_money(value);
            let diff = (rounded - value).abs();
            prop_assert!(diff < Decimal::new(1, 2));
        }

        /// Rounding is idempotent
        #[test]
        fn prop_rounding_idempotent(value in amount_strategy()) {
            let once = round_money(value);
            prop_assert_eq!(round_money(once), once);
        }

        /// The deducted-rotten policy never yields more than the recorded
        /// policy for the same line
        #[test]
        fn prop_deducted_policy_never_exceeds_recorded(
            weight in weight_strategy(),
            price in price_strategy(),
            discount in percent_strategy(),
            rotten in weight_strategy()
        ) {
            let recorded = sales_line_total(
                weight, price, discount, rotten, RottenPolicy::Recorded,
            ).unwrap();
            let deducted = sales_line_total(
                weight, price, discount, rotten, RottenPolicy::Deducted,
            ).unwrap();

            prop_assert!(deducted <= recorded);
        }
    }
}
