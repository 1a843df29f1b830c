//! Sales invoice service
//!
//! Creating a sales invoice derives the line totals and the
//! commission/packaging chain, decrements product stock, and allocates the
//! sold quantity against purchased lots, all inside one transaction.
//! Stock rows are taken `FOR UPDATE` so concurrent sales of the same
//! product serialize instead of racing the read-modify-write.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::derivation::{
    invoice_net_total, net_total_after_commission, net_total_after_packaging, packaging_total,
    remaining_quantity, round_money, sales_line_total,
};
use shared::models::{SalesInvoice, SalesLot, SalesProduct};
use shared::types::DateRange;
use shared::validation::{
    validate_crate_count, validate_invoice_number, validate_price, validate_quantity,
};

use crate::config::LedgerConfig;
use crate::error::{AppError, AppResult};

/// Sales invoice service
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
    ledger: LedgerConfig,
}

/// Input for one sold product line
#[derive(Debug, Clone, Deserialize)]
pub struct SalesLineInput {
    pub product_id: Uuid,
    pub gross_weight: Decimal,
    pub net_weight: Decimal,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub rotten: Decimal,
}

/// Allocation of sold quantity against a purchased lot
#[derive(Debug, Clone, Deserialize)]
pub struct LotAllocationInput {
    pub purchase_invoice_id: Uuid,
    pub quantity: Decimal,
}

/// Input for creating a sales invoice
#[derive(Debug, Deserialize)]
pub struct CreateSalesInvoiceInput {
    pub customer_id: Uuid,
    pub date: NaiveDate,
    pub invoice_number: String,
    pub vehicle_number: Option<String>,
    pub gross_vehicle_weight: Option<Decimal>,
    pub reference: Option<String>,
    pub no_of_crates: i32,
    pub cost_per_crate: Decimal,
    pub lines: Vec<SalesLineInput>,
    pub lots: Vec<LotAllocationInput>,
}

/// A sales invoice with its lines and lot allocations
#[derive(Debug, Clone, Serialize)]
pub struct SalesInvoiceWithLines {
    pub invoice: SalesInvoice,
    pub lines: Vec<SalesProduct>,
    pub lots: Vec<SalesLot>,
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    customer_id: Uuid,
    date: NaiveDate,
    invoice_number: String,
    vehicle_number: Option<String>,
    gross_vehicle_weight: Option<Decimal>,
    reference: Option<String>,
    net_total: Decimal,
    net_total_after_commission: Decimal,
    no_of_crates: i32,
    cost_per_crate: Decimal,
    net_total_after_packaging: Decimal,
    paid_amount: Decimal,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<InvoiceRow> for SalesInvoice {
    fn from(row: InvoiceRow) -> Self {
        SalesInvoice {
            id: row.id,
            customer_id: row.customer_id,
            date: row.date,
            invoice_number: row.invoice_number,
            vehicle_number: row.vehicle_number,
            gross_vehicle_weight: row.gross_vehicle_weight,
            reference: row.reference,
            net_total: row.net_total,
            net_total_after_commission: row.net_total_after_commission,
            no_of_crates: row.no_of_crates,
            cost_per_crate: row.cost_per_crate,
            net_total_after_packaging: row.net_total_after_packaging,
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
    serial_number: i32,
    gross_weight: Decimal,
    net_weight: Decimal,
    price: Decimal,
    discount_percent: Decimal,
    rotten: Decimal,
    total: Decimal,
}

impl From<LineRow> for SalesProduct {
    fn from(row: LineRow) -> Self {
        SalesProduct {
            id: row.id,
            invoice_id: row.invoice_id,
            product_id: row.product_id,
            serial_number: row.serial_number,
            gross_weight: row.gross_weight,
            net_weight: row.net_weight,
            price: row.price,
            discount_percent: row.discount_percent,
            rotten: row.rotten,
            total: row.total,
        }
    }
}

const INVOICE_COLUMNS: &str = "id, customer_id, date, invoice_number, vehicle_number, \
     gross_vehicle_weight, reference, net_total, net_total_after_commission, no_of_crates, \
     cost_per_crate, net_total_after_packaging, paid_amount, created_at, updated_at";

const LINE_COLUMNS: &str = "id, invoice_id, product_id, serial_number, gross_weight, \
     net_weight, price, discount_percent, rotten, total";

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool, ledger: LedgerConfig) -> Self {
        Self { db, ledger }
    }

    /// Create a sales invoice with its lines and lot allocations
    pub async fn create_invoice(
        &self,
        input: CreateSalesInvoiceInput,
    ) -> AppResult<SalesInvoiceWithLines> {
        validate_invoice_number(&input.invoice_number)
            .map_err(|msg| AppError::validation("invoice_number", msg))?;
        validate_crate_count(input.no_of_crates)
            .map_err(|msg| AppError::validation("no_of_crates", msg))?;
        validate_price(input.cost_per_crate)
            .map_err(|msg| AppError::validation("cost_per_crate", msg))?;
        if let Some(weight) = input.gross_vehicle_weight {
            validate_quantity(weight)
                .map_err(|msg| AppError::validation("gross_vehicle_weight", msg))?;
        }

        // Commission: per-customer override, else the configured default
        let commission_override = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT commission_rate FROM customers WHERE id = $1",
        )
        .bind(input.customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        let commission_rate = commission_override.unwrap_or(self.ledger.default_commission_rate);

        // Derive and round line totals before touching storage
        let mut line_totals = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let total = sales_line_total(
                line.net_weight,
                line.price,
                line.discount_percent,
                line.rotten,
                self.ledger.rotten_policy,
            )?;
            line_totals.push(round_money(total));
        }

        let net_total = invoice_net_total(&line_totals)?;
        let after_commission = round_money(net_total_after_commission(net_total, commission_rate));
        let packaging = round_money(packaging_total(input.no_of_crates, input.cost_per_crate));
        let after_packaging = net_total_after_packaging(after_commission, packaging);

        let mut tx = self.db.begin().await?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sales_invoices WHERE invoice_number = $1)",
        )
        .bind(&input.invoice_number)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateEntry("invoice number".to_string()));
        }

        let invoice_row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "INSERT INTO sales_invoices
                 (customer_id, date, invoice_number, vehicle_number, gross_vehicle_weight,
                  reference, net_total, net_total_after_commission, no_of_crates,
                  cost_per_crate, net_total_after_packaging)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(input.customer_id)
        .bind(input.date)
        .bind(&input.invoice_number)
        .bind(&input.vehicle_number)
        .bind(input.gross_vehicle_weight)
        .bind(&input.reference)
        .bind(net_total)
        .bind(after_commission)
        .bind(input.no_of_crates)
        .bind(input.cost_per_crate)
        .bind(after_packaging)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for (idx, (line, total)) in input.lines.iter().zip(&line_totals).enumerate() {
            self.take_stock(&mut tx, line.product_id, line.net_weight).await?;

            let line_row = sqlx::query_as::<_, LineRow>(&format!(
                "INSERT INTO sales_products
                     (invoice_id, product_id, serial_number, gross_weight, net_weight,
                      price, discount_percent, rotten, total)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 RETURNING {LINE_COLUMNS}"
            ))
            .bind(invoice_row.id)
            .bind(line.product_id)
            .bind((idx + 1) as i32)
            .bind(line.gross_weight)
            .bind(line.net_weight)
            .bind(line.price)
            .bind(line.discount_percent)
            .bind(line.rotten)
            .bind(total)
            .fetch_one(&mut *tx)
            .await?;

            lines.push(line_row.into());
        }

        let mut lots = Vec::with_capacity(input.lots.len());
        for allocation in &input.lots {
            lots.push(
                self.allocate_lot(&mut tx, invoice_row.id, allocation)
                    .await?,
            );
        }

        tx.commit().await?;

        Ok(SalesInvoiceWithLines {
            invoice: invoice_row.into(),
            lines,
            lots,
        })
    }

    /// Get a sales invoice with its lines and lot allocations
    pub async fn get_invoice(&self, invoice_id: Uuid) -> AppResult<SalesInvoiceWithLines> {
        let invoice = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM sales_invoices WHERE id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales invoice".to_string()))?;

        let lines = sqlx::query_as::<_, LineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM sales_products
             WHERE invoice_id = $1
             ORDER BY serial_number"
        ))
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        let lots = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Decimal)>(
            "SELECT id, sales_invoice_id, purchase_invoice_id, quantity
             FROM sales_lots
             WHERE sales_invoice_id = $1
             ORDER BY id",
        )
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SalesInvoiceWithLines {
            invoice: invoice.into(),
            lines: lines.into_iter().map(SalesProduct::from).collect(),
            lots: lots
                .into_iter()
                .map(|(id, sales_invoice_id, purchase_invoice_id, quantity)| SalesLot {
                    id,
                    sales_invoice_id,
                    purchase_invoice_id,
                    quantity,
                })
                .collect(),
        })
    }

    /// List sales invoices, optionally filtered by customer and date range
    pub async fn list_invoices(
        &self,
        customer_id: Option<Uuid>,
        range: Option<DateRange>,
    ) -> AppResult<Vec<SalesInvoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM sales_invoices
             WHERE ($1::uuid IS NULL OR customer_id = $1)
               AND ($2::date IS NULL OR date >= $2)
               AND ($3::date IS NULL OR date <= $3)
             ORDER BY date DESC, invoice_number DESC"
        ))
        .bind(customer_id)
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(SalesInvoice::from).collect())
    }

    /// Delete a sales invoice, restoring the stock its lines consumed.
    /// Lines, lot allocations and payments go with it in one transaction.
    pub async fn delete_invoice(&self, invoice_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sales_invoices WHERE id = $1)",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Sales invoice".to_string()));
        }

        let lines = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT product_id, net_weight FROM sales_products WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, net_weight) in lines {
            sqlx::query(
                "UPDATE products
                 SET current_stock = current_stock + $1, updated_at = now()
                 WHERE id = $2",
            )
            .bind(net_weight)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM payments WHERE invoice_kind = 'sales' AND invoice_id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        // Lines and lot allocations cascade with the invoice
        sqlx::query("DELETE FROM sales_invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Unsold quantity remaining on a purchase lot
    pub async fn lot_remaining_quantity(&self, purchase_invoice_id: Uuid) -> AppResult<Decimal> {
        let row = sqlx::query_as::<_, (Option<Decimal>, Option<Decimal>)>(
            "SELECT
                 (SELECT SUM(quantity) FROM purchase_products WHERE invoice_id = $1),
                 (SELECT SUM(quantity) FROM sales_lots WHERE purchase_invoice_id = $1)",
        )
        .bind(purchase_invoice_id)
        .fetch_one(&self.db)
        .await?;

        let purchased = row.0.ok_or_else(|| AppError::NotFound("Purchase lot".to_string()))?;
        Ok(remaining_quantity(purchased, row.1.unwrap_or(Decimal::ZERO)))
    }

    /// Lock the product's stock row and take `net_weight` out of it
    async fn take_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        net_weight: Decimal,
    ) -> AppResult<()> {
        let current = sqlx::query_scalar::<_, Decimal>(
            "SELECT current_stock FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if current < net_weight {
            return Err(AppError::InsufficientStock(format!(
                "product {product_id} has {current} kg in stock, {net_weight} kg requested"
            )));
        }

        sqlx::query(
            "UPDATE products
             SET current_stock = current_stock - $1, updated_at = now()
             WHERE id = $2",
        )
        .bind(net_weight)
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Allocate sold quantity against a purchase lot, guarded by the lot's
    /// remaining quantity. The purchase invoice row is locked so concurrent
    /// allocations against the same lot serialize.
    async fn allocate_lot(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sales_invoice_id: Uuid,
        allocation: &LotAllocationInput,
    ) -> AppResult<SalesLot> {
        if allocation.quantity <= Decimal::ZERO {
            return Err(AppError::validation(
                "quantity",
                "Lot allocation quantity must be positive",
            ));
        }

        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM purchase_invoices WHERE id = $1 FOR UPDATE",
        )
        .bind(allocation.purchase_invoice_id)
        .fetch_optional(&mut **tx)
        .await?;

        if locked.is_none() {
            return Err(AppError::NotFound("Purchase lot".to_string()));
        }

        let sums = sqlx::query_as::<_, (Option<Decimal>, Option<Decimal>)>(
            "SELECT
                 (SELECT SUM(quantity) FROM purchase_products WHERE invoice_id = $1),
                 (SELECT SUM(quantity) FROM sales_lots WHERE purchase_invoice_id = $1)",
        )
        .bind(allocation.purchase_invoice_id)
        .fetch_one(&mut **tx)
        .await?;

        let purchased = sums.0.unwrap_or(Decimal::ZERO);
        let sold = sums.1.unwrap_or(Decimal::ZERO);
        let remaining = remaining_quantity(purchased, sold);

        if allocation.quantity > remaining {
            return Err(AppError::InsufficientLotQuantity(format!(
                "lot {} has {} kg remaining, {} kg requested",
                allocation.purchase_invoice_id, remaining, allocation.quantity
            )));
        }

        let row = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Decimal)>(
            "INSERT INTO sales_lots (sales_invoice_id, purchase_invoice_id, quantity)
             VALUES ($1, $2, $3)
             RETURNING id, sales_invoice_id, purchase_invoice_id, quantity",
        )
        .bind(sales_invoice_id)
        .bind(allocation.purchase_invoice_id)
        .bind(allocation.quantity)
        .fetch_one(&mut **tx)
        .await?;

        Ok(SalesLot {
            id: row.0,
            sales_invoice_id: row.1,
            purchase_invoice_id: row.2,
            quantity: row.3,
        })
    }
}
