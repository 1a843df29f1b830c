//! Sales invoice, line and lot-allocation models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An invoice for produce sold to a customer
///
/// The three totals form a chain: `net_total` (sum of lines) →
/// `net_total_after_commission` (plus commission) →
/// `net_total_after_packaging` (plus crate packaging cost). The due balance
/// is settled against the end of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesInvoice {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
    /// Human-facing invoice number, unique across sales invoices
    pub invoice_number: String,
    pub vehicle_number: Option<String>,
    /// Weighbridge reading for the loaded vehicle, in kg
    pub gross_vehicle_weight: Option<Decimal>,
    pub reference: Option<String>,
    pub net_total: Decimal,
    pub net_total_after_commission: Decimal,
    pub no_of_crates: i32,
    pub cost_per_crate: Decimal,
    pub net_total_after_packaging: Decimal,
    pub paid_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalesInvoice {
    /// Outstanding balance; negative when the customer overpaid
    pub fn due_amount(&self) -> Decimal {
        self.net_total_after_packaging - self.paid_amount
    }

    /// Commission charged on this invoice
    pub fn commission_amount(&self) -> Decimal {
        self.net_total_after_commission - self.net_total
    }

    /// Packaging cost charged on this invoice
    pub fn packaging_total(&self) -> Decimal {
        self.net_total_after_packaging - self.net_total_after_commission
    }
}

/// One sold product line on a sales invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesProduct {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    /// Position of the line on the printed invoice
    pub serial_number: i32,
    /// Weight including crates, in kg
    pub gross_weight: Decimal,
    /// Billable weight in kg
    pub net_weight: Decimal,
    /// Unit price per kg
    pub price: Decimal,
    /// Discount in percent (0-100)
    pub discount_percent: Decimal,
    /// Rotten weight in kg, recorded on the line
    pub rotten: Decimal,
    /// Derived line total
    pub total: Decimal,
}

/// Allocation of a sale against a purchased lot
///
/// Links a sales invoice to the purchase invoice whose lot the sold produce
/// came from. The remaining quantity of a lot is the purchased quantity
/// minus the sum of these allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesLot {
    pub id: Uuid,
    pub sales_invoice_id: Uuid,
    pub purchase_invoice_id: Uuid,
    /// Allocated quantity in kg
    pub quantity: Decimal,
}
