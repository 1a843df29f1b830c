//! Packaging invoice model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An invoice for crate packaging costs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingInvoice {
    pub id: Uuid,
    pub date: NaiveDate,
    pub no_of_crates: i32,
    pub cost_per_crate: Decimal,
    /// Derived: `no_of_crates` × `cost_per_crate`
    pub packaging_total: Decimal,
    pub created_at: DateTime<Utc>,
}
