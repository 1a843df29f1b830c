//! Vendor and customer models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vendor the operation purchases produce lots from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseVendor {
    pub id: Uuid,
    pub name: String,
    pub contact_number: Option<String>,
    pub area: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A customer the operation sells to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub contact_number: Option<String>,
    pub area: Option<String>,
    /// Per-customer commission rate override (fraction, e.g. 0.10 for 10%).
    /// Falls back to the configured default when absent.
    pub commission_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}
