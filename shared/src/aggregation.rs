//! Aggregation engine for cross-entity report rollups
//!
//! Pure functions over rows already fetched from storage. Ordering and
//! tie-breaking are done here rather than in SQL so that report sequences
//! are deterministic. Aggregating an empty input always yields zero or an
//! empty sequence, never an error, and every division is guarded.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::derivation::remaining_quantity;
use crate::types::DateRange;

/// A derived total attached to an invoice date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatedTotal {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Invoiced and paid sums for one vendor or customer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyBalance {
    pub party_id: Uuid,
    pub name: String,
    pub invoiced: Decimal,
    pub paid: Decimal,
}

impl PartyBalance {
    /// Outstanding balance owed by/to the party; may be negative
    pub fn due(&self) -> Decimal {
        self.invoiced - self.paid
    }
}

/// Summed sales figures for one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSales {
    pub product_id: Uuid,
    pub name: String,
    pub quantity_sold: Decimal,
    pub revenue: Decimal,
}

/// Purchased vs. sold quantity for one purchase lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LotBalance {
    pub purchase_invoice_id: Uuid,
    pub lot_number: String,
    pub purchased: Decimal,
    pub sold: Decimal,
}

impl LotBalance {
    pub fn remaining(&self) -> Decimal {
        remaining_quantity(self.purchased, self.sold)
    }
}

// ============================================================================
// Rollups
// ============================================================================

/// Sum of totals whose date falls in the range, inclusive on both ends
pub fn total_in_range(items: &[DatedTotal], range: DateRange) -> Decimal {
    items
        .iter()
        .filter(|item| range.contains(item.date))
        .map(|item| item.total)
        .sum()
}

/// The `n` parties with the highest dues, descending; ties broken by party
/// id ascending so the ranking is stable across runs
pub fn top_n_by_due(mut balances: Vec<PartyBalance>, n: usize) -> Vec<PartyBalance> {
    balances.sort_by(|a, b| b.due().cmp(&a.due()).then(a.party_id.cmp(&b.party_id)));
    balances.truncate(n);
    balances
}

/// Overall profit and loss: sales minus everything spent
pub fn profit_and_loss(
    sales_total: Decimal,
    purchase_total: Decimal,
    expense_total: Decimal,
    packaging_total: Decimal,
    damage_total: Decimal,
) -> Decimal {
    sales_total - (purchase_total + expense_total + packaging_total + damage_total)
}

/// The `n` best-selling products by summed sold quantity, descending; ties
/// broken by revenue descending, then product id ascending
pub fn top_selling_products(mut products: Vec<ProductSales>, n: usize) -> Vec<ProductSales> {
    products.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then(b.revenue.cmp(&a.revenue))
            .then(a.product_id.cmp(&b.product_id))
    });
    products.truncate(n);
    products
}

/// Purchase lots with unsold quantity remaining, ordered by lot number.
/// Drives the lot picker when a new sale is allocated.
pub fn available_lots(mut lots: Vec<LotBalance>) -> Vec<LotBalance> {
    lots.retain(|lot| lot.remaining() > Decimal::ZERO);
    lots.sort_by(|a, b| a.lot_number.cmp(&b.lot_number));
    lots
}

/// One zero-filled bucket per day for the `days` days ending at `end`
/// (inclusive), ascending by date. Feeds the sales-trend chart.
pub fn daily_totals(items: &[DatedTotal], end: NaiveDate, days: u32) -> Vec<DatedTotal> {
    (0..days)
        .rev()
        .filter_map(|offset| end.checked_sub_days(Days::new(offset as u64)))
        .map(|date| DatedTotal {
            date,
            total: items
                .iter()
                .filter(|item| item.date == date)
                .map(|item| item.total)
                .sum(),
        })
        .collect()
}

// ============================================================================
// Guarded division
// ============================================================================

/// `numerator / denominator`, or zero when the denominator is zero
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// `part` as a percentage of `whole`, or zero when `whole` is zero
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    ratio(part, whole) * Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn balance(id: u128, name: &str, invoiced: &str, paid: &str) -> PartyBalance {
        PartyBalance {
            party_id: Uuid::from_u128(id),
            name: name.to_string(),
            invoiced: dec(invoiced),
            paid: dec(paid),
        }
    }

    // ========================================================================
    // Rollup tests
    // ========================================================================

    #[test]
    fn test_total_in_range_inclusive_bounds() {
        let items = vec![
            DatedTotal { date: date(2025, 4, 1), total: dec("100") },
            DatedTotal { date: date(2025, 4, 15), total: dec("250") },
            DatedTotal { date: date(2025, 4, 30), total: dec("50") },
            DatedTotal { date: date(2025, 5, 1), total: dec("999") },
        ];
        let range = DateRange::new(date(2025, 4, 1), date(2025, 4, 30));
        assert_eq!(total_in_range(&items, range), dec("400"));
    }

    #[test]
    fn test_total_in_range_empty_is_zero() {
        let range = DateRange::new(date(2025, 4, 1), date(2025, 4, 30));
        assert_eq!(total_in_range(&[], range), Decimal::ZERO);
    }

    #[test]
    fn test_top_n_by_due_orders_descending() {
        let parties = vec![
            balance(1, "Anwar Traders", "1000", "800"),
            balance(2, "Bashir & Sons", "5000", "1000"),
            balance(3, "City Fruits", "300", "0"),
        ];
        let top = top_n_by_due(parties, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Bashir & Sons");
        assert_eq!(top[0].due(), dec("4000"));
        assert_eq!(top[1].name, "City Fruits");
    }

    #[test]
    fn test_top_n_by_due_ties_break_by_id() {
        let parties = vec![
            balance(9, "Later", "100", "0"),
            balance(4, "Earlier", "100", "0"),
        ];
        let top = top_n_by_due(parties, 2);
        assert_eq!(top[0].name, "Earlier");
        assert_eq!(top[1].name, "Later");
    }

    #[test]
    fn test_top_n_by_due_empty_input() {
        assert!(top_n_by_due(Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_profit_and_loss() {
        let pnl = profit_and_loss(dec("10000"), dec("6000"), dec("1500"), dec("300"), dec("200"));
        assert_eq!(pnl, dec("2000"));
    }

    #[test]
    fn test_profit_and_loss_all_zero() {
        let zero = Decimal::ZERO;
        assert_eq!(profit_and_loss(zero, zero, zero, zero, zero), zero);
    }

    #[test]
    fn test_top_selling_products_quantity_then_revenue() {
        let products = vec![
            ProductSales {
                product_id: Uuid::from_u128(1),
                name: "Kesar".to_string(),
                quantity_sold: dec("500"),
                revenue: dec("20000"),
            },
            ProductSales {
                product_id: Uuid::from_u128(2),
                name: "Alphonso".to_string(),
                quantity_sold: dec("500"),
                revenue: dec("45000"),
            },
            ProductSales {
                product_id: Uuid::from_u128(3),
                name: "Dasheri".to_string(),
                quantity_sold: dec("900"),
                revenue: dec("18000"),
            },
        ];
        let top = top_selling_products(products, 3);
        assert_eq!(top[0].name, "Dasheri");
        assert_eq!(top[1].name, "Alphonso"); // tie on quantity, higher revenue
        assert_eq!(top[2].name, "Kesar");
    }

    #[test]
    fn test_available_lots_filters_and_sorts() {
        let lots = vec![
            LotBalance {
                purchase_invoice_id: Uuid::from_u128(1),
                lot_number: "LOT-2025-0007".to_string(),
                purchased: dec("500"),
                sold: dec("500"),
            },
            LotBalance {
                purchase_invoice_id: Uuid::from_u128(2),
                lot_number: "LOT-2025-0002".to_string(),
                purchased: dec("300"),
                sold: dec("120"),
            },
            LotBalance {
                purchase_invoice_id: Uuid::from_u128(3),
                lot_number: "LOT-2025-0001".to_string(),
                purchased: dec("200"),
                sold: dec("40"),
            },
        ];
        let available = available_lots(lots);
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].lot_number, "LOT-2025-0001");
        assert_eq!(available[1].lot_number, "LOT-2025-0002");
        assert_eq!(available[1].remaining(), dec("180"));
    }

    #[test]
    fn test_daily_totals_window() {
        let items = vec![
            DatedTotal { date: date(2025, 6, 10), total: dec("100") },
            DatedTotal { date: date(2025, 6, 10), total: dec("40") },
            DatedTotal { date: date(2025, 6, 8), total: dec("75") },
            DatedTotal { date: date(2025, 6, 1), total: dec("999") }, // outside window
        ];
        let series = daily_totals(&items, date(2025, 6, 10), 3);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0], DatedTotal { date: date(2025, 6, 8), total: dec("75") });
        assert_eq!(series[1], DatedTotal { date: date(2025, 6, 9), total: Decimal::ZERO });
        assert_eq!(series[2], DatedTotal { date: date(2025, 6, 10), total: dec("140") });
    }

    // ========================================================================
    // Guarded division tests
    // ========================================================================

    #[test]
    fn test_ratio_guards_zero_denominator() {
        assert_eq!(ratio(dec("10"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio(dec("10"), dec("4")), dec("2.5"));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec("25"), dec("200")), dec("12.5"));
        assert_eq!(percent_of(dec("25"), Decimal::ZERO), Decimal::ZERO);
    }
}
