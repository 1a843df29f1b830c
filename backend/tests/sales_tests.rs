//! Sales flow tests
//!
//! Tests the stock and lot bookkeeping around sales invoices:
//! - stock is taken at creation and restored at deletion
//! - lot allocations are capped by the lot's remaining quantity
//! - the commission rate resolves per customer with a configured fallback

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::derivation::{
    invoice_net_total, net_total_after_commission, net_total_after_packaging, packaging_total,
    remaining_quantity, round_money, sales_line_total,
};
use shared::types::RottenPolicy;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Take sold weight out of a stock level, refusing to go negative.
/// Mirrors the guarded read-modify-write the sales service runs under a
/// row lock.
fn take_stock(current: Decimal, requested: Decimal) -> Result<Decimal, &'static str> {
    if requested < Decimal::ZERO {
        return Err("Requested weight cannot be negative");
    }
    if current < requested {
        return Err("Insufficient stock");
    }
    Ok(current - requested)
}

/// Allocate sold quantity against a lot, capped by what remains
fn allocate_lot(
    purchased: Decimal,
    already_sold: Decimal,
    requested: Decimal,
) -> Result<Decimal, &'static str> {
    if requested <= Decimal::ZERO {
        return Err("Allocation must be positive");
    }
    let remaining = remaining_quantity(purchased, already_sold);
    if requested > remaining {
        return Err("Insufficient lot quantity");
    }
    Ok(already_sold + requested)
}

/// Commission rate resolution: customer override wins over the default
fn resolve_commission_rate(customer_rate: Option<Decimal>, default_rate: Decimal) -> Decimal {
    customer_rate.unwrap_or(default_rate)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_take_stock() {
        assert_eq!(take_stock(dec("100"), dec("30")).unwrap(), dec("70"));
        assert_eq!(take_stock(dec("100"), dec("100")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_take_stock_insufficient() {
        assert!(take_stock(dec("50"), dec("50.001")).is_err());
    }

    #[test]
    fn test_delete_restores_stock() {
        // Selling then deleting the invoice leaves stock where it started
        let opening = dec("250");
        let sold = dec("80");
        let after_sale = take_stock(opening, sold).unwrap();
        let after_delete = after_sale + sold;
        assert_eq!(after_delete, opening);
    }

    #[test]
    fn test_allocate_lot_within_remaining() {
        let sold = allocate_lot(dec("500"), dec("350"), dec("150")).unwrap();
        assert_eq!(sold, dec("500"));
    }

    #[test]
    fn test_allocate_lot_over_remaining() {
        assert!(allocate_lot(dec("500"), dec("350"), dec("150.5")).is_err());
    }

    #[test]
    fn test_allocate_lot_rejects_non_positive() {
        assert!(allocate_lot(dec("500"), dec("0"), Decimal::ZERO).is_err());
        assert!(allocate_lot(dec("500"), dec("0"), dec("-10")).is_err());
    }

    #[test]
    fn test_commission_rate_override() {
        let default_rate = dec("0.10");
        assert_eq!(
            resolve_commission_rate(Some(dec("0.06")), default_rate),
            dec("0.06")
        );
        assert_eq!(resolve_commission_rate(None, default_rate), dec("0.10"));
    }

    /// Full derivation pass for a two-line invoice, the way the service
    /// persists it: lines rounded first, chain computed over the stored sums
    #[test]
    fn test_invoice_derivation_pass() {
        let line1 = round_money(
            sales_line_total(dec("120"), dec("35.00"), dec("2"), Decimal::ZERO, RottenPolicy::Recorded)
                .unwrap(),
        );
        let line2 = round_money(
            sales_line_total(dec("80"), dec("11.25"), Decimal::ZERO, Decimal::ZERO, RottenPolicy::Recorded)
                .unwrap(),
        );
        assert_eq!(line1, dec("4116.00"));
        assert_eq!(line2, dec("900.00"));

        let net = invoice_net_total(&[line1, line2]).unwrap();
        assert_eq!(net, dec("5016.00"));

        let after_commission = round_money(net_total_after_commission(net, dec("0.10")));
        assert_eq!(after_commission, dec("5517.60"));

        let packaging = round_money(packaging_total(24, dec("12.50")));
        assert_eq!(packaging, dec("300.00"));

        let after_packaging = net_total_after_packaging(after_commission, packaging);
        assert_eq!(after_packaging, dec("5817.60"));
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

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stock never goes negative through the guarded take
        #[test]
        fn prop_stock_never_negative(
            opening in weight_strategy(),
            requests in prop::collection::vec(weight_strategy(), 1..10)
        ) {
            let mut stock = opening;
            for request in requests {
                if let Ok(next) = take_stock(stock, request) {
                    stock = next;
                }
            }
            prop_assert!(stock >= Decimal::ZERO);
        }

        /// Selling and then restoring is a no-op on stock
        #[test]
        fn prop_sell_then_restore_roundtrips(
            opening in weight_strategy(),
            sold in weight_strategy()
        ) {
            if let Ok(after) = take_stock(opening, sold) {
                prop_assert_eq!(after + sold, opening);
            }
        }

        /// Accepted allocations never exceed the purchased quantity
        #[test]
        fn prop_allocations_capped_by_purchase(
            purchased in weight_strategy(),
            requests in prop::collection::vec(weight_strategy(), 1..10)
        ) {
            let mut sold = Decimal::ZERO;
            for request in requests {
                if let Ok(next) = allocate_lot(purchased, sold, request) {
                    sold = next;
                }
            }
            prop_assert!(sold <= purchased);
            prop_assert!(remaining_quantity(purchased, sold) >= Decimal::ZERO);
        }

        /// The resolved commission rate is always one of the two candidates
        #[test]
        fn prop_commission_resolution_total(
            has_override in any::<bool>(),
            override_bps in 0i64..=2000i64,
            default_bps in 0i64..=2000i64
        ) {
            let override_rate = Decimal::new(override_bps, 4);
            let default_rate = Decimal::new(default_bps, 4);
            let customer = if has_override { Some(override_rate) } else { None };

            let resolved = resolve_commission_rate(customer, default_rate);
            prop_assert!(resolved == override_rate || resolved == default_rate);
        }
    }
}
