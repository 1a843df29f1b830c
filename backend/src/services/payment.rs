//! Payment service
//!
//! Payments settle against purchase invoices (what the operation owes
//! vendors) and sales invoices (what customers owe the operation). Every
//! mutation recomputes the invoice's `paid_amount` from the payment rows
//! inside the same transaction, so the stored figure always equals the sum
//! of its payments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::derivation::due_amount;
use shared::models::Payment;
use shared::types::InvoiceKind;
use shared::validation::validate_payment_amount;

use crate::error::{AppError, AppResult};

/// Payment service
#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
}

/// Input for recording a payment
#[derive(Debug, Deserialize)]
pub struct RecordPaymentInput {
    pub invoice_kind: InvoiceKind,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// Refreshed balance of an invoice after a payment mutation.
///
/// `due` may be negative: overpayment is surfaced, never clamped or
/// rejected. Keeping payments within the total is a business rule the
/// caller may warn about, not a storage constraint.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceBalance {
    pub invoice_kind: InvoiceKind,
    pub invoice_id: Uuid,
    pub total: Decimal,
    pub paid_amount: Decimal,
    pub due: Decimal,
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a payment and return it with the invoice's refreshed balance
    pub async fn record_payment(
        &self,
        input: RecordPaymentInput,
    ) -> AppResult<(Payment, InvoiceBalance)> {
        validate_payment_amount(input.amount)
            .map_err(|msg| AppError::validation("amount", msg))?;

        let mut tx = self.db.begin().await?;

        let total = lock_invoice_total(&mut tx, input.invoice_kind, input.invoice_id).await?;

        let row = sqlx::query_as::<_, (Uuid, chrono::DateTime<chrono::Utc>)>(
            "INSERT INTO payments (invoice_kind, invoice_id, amount, date)
             VALUES ($1, $2, $3, $4)
             RETURNING id, created_at",
        )
        .bind(input.invoice_kind.as_str())
        .bind(input.invoice_id)
        .bind(input.amount)
        .bind(input.date)
        .fetch_one(&mut *tx)
        .await?;

        let balance =
            refresh_paid_amount(&mut tx, input.invoice_kind, input.invoice_id, total).await?;

        tx.commit().await?;

        let payment = Payment {
            id: row.0,
            invoice_kind: input.invoice_kind,
            invoice_id: input.invoice_id,
            amount: input.amount,
            date: input.date,
            created_at: row.1,
        };

        Ok((payment, balance))
    }

    /// List payments recorded against an invoice, oldest first
    pub async fn list_payments(
        &self,
        invoice_kind: InvoiceKind,
        invoice_id: Uuid,
    ) -> AppResult<Vec<Payment>> {
        invoice_exists(&self.db, invoice_kind, invoice_id).await?;

        let rows = sqlx::query_as::<_, (Uuid, Decimal, NaiveDate, chrono::DateTime<chrono::Utc>)>(
            "SELECT id, amount, date, created_at FROM payments
             WHERE invoice_kind = $1 AND invoice_id = $2
             ORDER BY date, created_at",
        )
        .bind(invoice_kind.as_str())
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, amount, date, created_at)| Payment {
                id,
                invoice_kind,
                invoice_id,
                amount,
                date,
                created_at,
            })
            .collect())
    }

    /// Delete a payment and return the invoice's refreshed balance
    pub async fn delete_payment(&self, payment_id: Uuid) -> AppResult<InvoiceBalance> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, (String, Uuid)>(
            "SELECT invoice_kind, invoice_id FROM payments WHERE id = $1",
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".to_string()))?;

        let invoice_kind = match row.0.as_str() {
            "purchase" => InvoiceKind::Purchase,
            _ => InvoiceKind::Sales,
        };
        let invoice_id = row.1;

        let total = lock_invoice_total(&mut tx, invoice_kind, invoice_id).await?;

        sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;

        let balance = refresh_paid_amount(&mut tx, invoice_kind, invoice_id, total).await?;

        tx.commit().await?;

        Ok(balance)
    }

    /// Current balance of an invoice without mutating anything
    pub async fn invoice_balance(
        &self,
        invoice_kind: InvoiceKind,
        invoice_id: Uuid,
    ) -> AppResult<InvoiceBalance> {
        let (total, paid) = match invoice_kind {
            InvoiceKind::Purchase => sqlx::query_as::<_, (Decimal, Decimal)>(
                "SELECT net_total_after_cash_cutting, paid_amount
                 FROM purchase_invoices WHERE id = $1",
            ),
            InvoiceKind::Sales => sqlx::query_as::<_, (Decimal, Decimal)>(
                "SELECT net_total_after_packaging, paid_amount
                 FROM sales_invoices WHERE id = $1",
            ),
        }
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        Ok(InvoiceBalance {
            invoice_kind,
            invoice_id,
            total,
            paid_amount: paid,
            due: due_amount(total, paid),
        })
    }
}

/// Lock the invoice row and return the total payments settle against:
/// after cash cutting for purchases, after packaging for sales
async fn lock_invoice_total(
    tx: &mut Transaction<'_, Postgres>,
    invoice_kind: InvoiceKind,
    invoice_id: Uuid,
) -> AppResult<Decimal> {
    let query = match invoice_kind {
        InvoiceKind::Purchase => {
            "SELECT net_total_after_cash_cutting FROM purchase_invoices WHERE id = $1 FOR UPDATE"
        }
        InvoiceKind::Sales => {
            "SELECT net_total_after_packaging FROM sales_invoices WHERE id = $1 FOR UPDATE"
        }
    };

    sqlx::query_scalar::<_, Decimal>(query)
        .bind(invoice_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
}

/// Recompute the invoice's paid_amount from its payment rows
async fn refresh_paid_amount(
    tx: &mut Transaction<'_, Postgres>,
    invoice_kind: InvoiceKind,
    invoice_id: Uuid,
    total: Decimal,
) -> AppResult<InvoiceBalance> {
    let paid = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0) FROM payments
         WHERE invoice_kind = $1 AND invoice_id = $2",
    )
    .bind(invoice_kind.as_str())
    .bind(invoice_id)
    .fetch_one(&mut **tx)
    .await?;

    let update = match invoice_kind {
        InvoiceKind::Purchase => {
            "UPDATE purchase_invoices SET paid_amount = $1, updated_at = now() WHERE id = $2"
        }
        InvoiceKind::Sales => {
            "UPDATE sales_invoices SET paid_amount = $1, updated_at = now() WHERE id = $2"
        }
    };

    sqlx::query(update)
        .bind(paid)
        .bind(invoice_id)
        .execute(&mut **tx)
        .await?;

    Ok(InvoiceBalance {
        invoice_kind,
        invoice_id,
        total,
        paid_amount: paid,
        due: due_amount(total, paid),
    })
}

/// Check the referenced invoice exists
async fn invoice_exists(
    db: &PgPool,
    invoice_kind: InvoiceKind,
    invoice_id: Uuid,
) -> AppResult<()> {
    let query = match invoice_kind {
        InvoiceKind::Purchase => "SELECT EXISTS(SELECT 1 FROM purchase_invoices WHERE id = $1)",
        InvoiceKind::Sales => "SELECT EXISTS(SELECT 1 FROM sales_invoices WHERE id = $1)",
    };

    let exists = sqlx::query_scalar::<_, bool>(query)
        .bind(invoice_id)
        .fetch_one(db)
        .await?;

    if !exists {
        return Err(AppError::NotFound("Invoice".to_string()));
    }

    Ok(())
}
