//! Purchase invoice service
//!
//! Creating a purchase invoice derives every line total and the invoice
//! totals through the shared derivation engine, then persists the rounded
//! values and bumps product stock inside one transaction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::derivation::{
    invoice_net_total, net_total_after_cash_cutting, purchase_line_total, round_money,
};
use shared::models::{PurchaseInvoice, PurchaseProduct};
use shared::types::DateRange;
use shared::validation::{validate_invoice_number, validate_lot_number};

use crate::config::LedgerConfig;
use crate::error::{AppError, AppResult};

/// Purchase invoice service
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
    ledger: LedgerConfig,
}

/// Input for one purchased product line
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub price: Decimal,
    pub damage_percent: Decimal,
    pub discount_percent: Decimal,
    pub rotten: Decimal,
    pub loading_unloading: Decimal,
}

/// Input for creating a purchase invoice
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseInvoiceInput {
    pub vendor_id: Uuid,
    pub date: NaiveDate,
    pub lot_number: String,
    pub invoice_number: String,
    pub lines: Vec<PurchaseLineInput>,
}

/// A purchase invoice with its lines
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseInvoiceWithLines {
    pub invoice: PurchaseInvoice,
    pub lines: Vec<PurchaseProduct>,
}

/// Per-vendor purchase summary for one year
#[derive(Debug, Serialize)]
pub struct VendorYearlySummary {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub year: i32,
    pub invoices: Vec<PurchaseInvoice>,
    pub total_amount: Decimal,
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    vendor_id: Uuid,
    date: NaiveDate,
    lot_number: String,
    invoice_number: String,
    net_total: Decimal,
    net_total_after_cash_cutting: Decimal,
    paid_amount: Decimal,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<InvoiceRow> for PurchaseInvoice {
    fn from(row: InvoiceRow) -> Self {
        PurchaseInvoice {
            id: row.id,
            vendor_id: row.vendor_id,
            date: row.date,
            lot_number: row.lot_number,
            invoice_number: row.invoice_number,
            net_total: row.net_total,
            net_total_after_cash_cutting: row.net_total_after_cash_cutting,
            paid_amount: row.paid_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: Uuid,
    invoice_id: Uuid,
    product_id: Uuid,
    quantity: Decimal,
    price: Decimal,
    damage_percent: Decimal,
    discount_percent: Decimal,
    rotten: Decimal,
    loading_unloading: Decimal,
    total: Decimal,
}

impl From<LineRow> for PurchaseProduct {
    fn from(row: LineRow) -> Self {
        PurchaseProduct {
            id: row.id,
            invoice_id: row.invoice_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
            damage_percent: row.damage_percent,
            discount_percent: row.discount_percent,
            rotten: row.rotten,
            loading_unloading: row.loading_unloading,
            total: row.total,
        }
    }
}

const INVOICE_COLUMNS: &str = "id, vendor_id, date, lot_number, invoice_number, net_total, \
     net_total_after_cash_cutting, paid_amount, created_at, updated_at";

const LINE_COLUMNS: &str = "id, invoice_id, product_id, quantity, price, damage_percent, \
     discount_percent, rotten, loading_unloading, total";

impl PurchaseService {
    /// Create a new PurchaseService instance
    pub fn new(db: PgPool, ledger: LedgerConfig) -> Self {
        Self { db, ledger }
    }

    /// Create a purchase invoice with its lines.
    ///
    /// Line totals and the cash-cutting chain come out of the derivation
    /// engine; the stored `net_total` is the sum of the *persisted* (rounded)
    /// line totals so the invariant holds exactly on disk. Product stock is
    /// increased by each line's quantity in the same transaction.
    pub async fn create_invoice(
        &self,
        input: CreatePurchaseInvoiceInput,
    ) -> AppResult<PurchaseInvoiceWithLines> {
        validate_lot_number(&input.lot_number)
            .map_err(|msg| AppError::validation("lot_number", msg))?;
        validate_invoice_number(&input.invoice_number)
            .map_err(|msg| AppError::validation("invoice_number", msg))?;

        let vendor_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_vendors WHERE id = $1)",
        )
        .bind(input.vendor_id)
        .fetch_one(&self.db)
        .await?;

        if !vendor_exists {
            return Err(AppError::NotFound("Vendor".to_string()));
        }

        // Derive and round line totals before touching storage
        let mut line_totals = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let total = purchase_line_total(
                line.quantity,
                line.price,
                line.damage_percent,
                line.discount_percent,
                line.rotten,
                line.loading_unloading,
                self.ledger.rotten_policy,
            )?;
            line_totals.push(round_money(total));
        }

        let net_total = invoice_net_total(&line_totals)?;
        let after_cash_cutting = round_money(net_total_after_cash_cutting(
            net_total,
            self.ledger.cash_cutting_rate,
        ));

        let mut tx = self.db.begin().await?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_invoices WHERE invoice_number = $1)",
        )
        .bind(&input.invoice_number)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateEntry("invoice number".to_string()));
        }

        let invoice_row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "INSERT INTO purchase_invoices
                 (vendor_id, date, lot_number, invoice_number, net_total,
                  net_total_after_cash_cutting)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(input.vendor_id)
        .bind(input.date)
        .bind(&input.lot_number)
        .bind(&input.invoice_number)
        .bind(net_total)
        .bind(after_cash_cutting)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for (line, total) in input.lines.iter().zip(&line_totals) {
            let line_row = sqlx::query_as::<_, LineRow>(&format!(
                "INSERT INTO purchase_products
                     (invoice_id, product_id, quantity, price, damage_percent,
                      discount_percent, rotten, loading_unloading, total)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 RETURNING {LINE_COLUMNS}"
            ))
            .bind(invoice_row.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .bind(line.damage_percent)
            .bind(line.discount_percent)
            .bind(line.rotten)
            .bind(line.loading_unloading)
            .bind(total)
            .fetch_one(&mut *tx)
            .await?;

            let updated = sqlx::query(
                "UPDATE products
                 SET current_stock = current_stock + $1, updated_at = now()
                 WHERE id = $2",
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(AppError::NotFound("Product".to_string()));
            }

            lines.push(line_row.into());
        }

        tx.commit().await?;

        Ok(PurchaseInvoiceWithLines {
            invoice: invoice_row.into(),
            lines,
        })
    }

    /// Get a purchase invoice with its lines
    pub async fn get_invoice(&self, invoice_id: Uuid) -> AppResult<PurchaseInvoiceWithLines> {
        let invoice = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM purchase_invoices WHERE id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase invoice".to_string()))?;

        let lines = sqlx::query_as::<_, LineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM purchase_products WHERE invoice_id = $1 ORDER BY id"
        ))
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseInvoiceWithLines {
            invoice: invoice.into(),
            lines: lines.into_iter().map(PurchaseProduct::from).collect(),
        })
    }

    /// List purchase invoices, optionally filtered by vendor and date range
    pub async fn list_invoices(
        &self,
        vendor_id: Option<Uuid>,
        range: Option<DateRange>,
    ) -> AppResult<Vec<PurchaseInvoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM purchase_invoices
             WHERE ($1::uuid IS NULL OR vendor_id = $1)
               AND ($2::date IS NULL OR date >= $2)
               AND ($3::date IS NULL OR date <= $3)
             ORDER BY date DESC, invoice_number DESC"
        ))
        .bind(vendor_id)
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PurchaseInvoice::from).collect())
    }

    /// Delete a purchase invoice, reversing the stock its lines added.
    ///
    /// Refused while any sales lot is allocated against the invoice: the
    /// sold produce came out of this lot, so the books would no longer
    /// reconcile.
    pub async fn delete_invoice(&self, invoice_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_invoices WHERE id = $1)",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Purchase invoice".to_string()));
        }

        let allocated = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sales_lots WHERE purchase_invoice_id = $1)",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        if allocated {
            return Err(AppError::ValidationError(
                "purchase invoice has sales lots allocated against it".to_string(),
            ));
        }

        // Reverse the stock each line added, guarding against going negative
        let lines = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT product_id, quantity FROM purchase_products WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity) in lines {
            let current = sqlx::query_scalar::<_, Decimal>(
                "SELECT current_stock FROM products WHERE id = $1 FOR UPDATE",
            )
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;

            if current < quantity {
                return Err(AppError::InsufficientStock(format!(
                    "removing invoice line would drive product {product_id} stock below zero"
                )));
            }

            sqlx::query(
                "UPDATE products
                 SET current_stock = current_stock - $1, updated_at = now()
                 WHERE id = $2",
            )
            .bind(quantity)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM payments WHERE invoice_kind = 'purchase' AND invoice_id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        // Lines cascade with the invoice
        sqlx::query("DELETE FROM purchase_invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Purchases from one vendor in one calendar year, with the summed total
    pub async fn vendor_yearly_summary(
        &self,
        vendor_id: Uuid,
        year: i32,
    ) -> AppResult<VendorYearlySummary> {
        let vendor_name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM purchase_vendors WHERE id = $1",
        )
        .bind(vendor_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor".to_string()))?;

        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM purchase_invoices
             WHERE vendor_id = $1 AND EXTRACT(YEAR FROM date)::int = $2
             ORDER BY date"
        ))
        .bind(vendor_id)
        .bind(year)
        .fetch_all(&self.db)
        .await?;

        let invoices: Vec<PurchaseInvoice> = rows.into_iter().map(PurchaseInvoice::from).collect();
        let total_amount = invoices.iter().map(|i| i.net_total).sum();

        Ok(VendorYearlySummary {
            vendor_id,
            vendor_name,
            year,
            invoices,
            total_amount,
        })
    }
}
