//! Purchase invoice and line models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An invoice for a purchased produce lot
///
/// `net_total`, `net_total_after_cash_cutting` and `paid_amount` are derived
/// fields: they are recomputed from the invoice's lines and payments every
/// time either changes, and stored rounded to two decimal places.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseInvoice {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub date: NaiveDate,
    /// Lot code for traceability (e.g. "LOT-2025-0042")
    pub lot_number: String,
    /// Human-facing invoice number, unique across purchase invoices
    pub invoice_number: String,
    /// Sum of line totals
    pub net_total: Decimal,
    /// Net total minus the cash-handling commission
    pub net_total_after_cash_cutting: Decimal,
    /// Sum of recorded payments
    pub paid_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseInvoice {
    /// Outstanding balance; negative when the vendor was overpaid
    pub fn due_amount(&self) -> Decimal {
        self.net_total_after_cash_cutting - self.paid_amount
    }
}

/// One purchased product line on a purchase invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseProduct {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    /// Quantity in kg
    pub quantity: Decimal,
    /// Unit price per kg
    pub price: Decimal,
    /// Damage deduction in percent (0-100)
    pub damage_percent: Decimal,
    /// Discount in percent (0-100)
    pub discount_percent: Decimal,
    /// Rotten weight in kg, recorded on the line
    pub rotten: Decimal,
    /// Loading/unloading charge added to the line
    pub loading_unloading: Decimal,
    /// Derived line total
    pub total: Decimal,
}
