//! Common types used across the ledger

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ISO 4217 code of the currency every monetary field is denominated in.
pub const CURRENCY: &str = "INR";

/// Which side of the ledger an invoice belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    Purchase,
    Sales,
}

impl InvoiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceKind::Purchase => "purchase",
            InvoiceKind::Sales => "sales",
        }
    }
}

impl std::fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How rotten produce recorded on a line affects the line total.
///
/// The books historically record the rotten weight without deducting it
/// from the total, so `Recorded` is the default. `Deducted` subtracts
/// rotten weight at the line's unit price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RottenPolicy {
    #[default]
    Recorded,
    Deducted,
}

/// Date range for queries, inclusive on both ends
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether a date falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
        );
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()));
    }

    #[test]
    fn test_invoice_kind_str() {
        assert_eq!(InvoiceKind::Purchase.as_str(), "purchase");
        assert_eq!(InvoiceKind::Sales.as_str(), "sales");
    }

    #[test]
    fn test_rotten_policy_default() {
        assert_eq!(RottenPolicy::default(), RottenPolicy::Recorded);
    }
}
