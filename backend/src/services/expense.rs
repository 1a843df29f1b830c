//! Expense, damage and packaging invoice service

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use shared::derivation::{packaging_total, round_money};
use shared::models::{Damages, Expense, ExpenseCategory, PackagingInvoice};
use shared::types::DateRange;
use shared::validation::{validate_crate_count, validate_price};

use crate::error::{AppError, AppResult};

/// Service for expenses, damages and packaging invoices
#[derive(Clone)]
pub struct ExpenseService {
    db: PgPool,
}

/// Input for recording an expense
#[derive(Debug, Deserialize)]
pub struct RecordExpenseInput {
    pub date: NaiveDate,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
}

/// Input for recording a damage loss
#[derive(Debug, Deserialize)]
pub struct RecordDamageInput {
    pub date: NaiveDate,
    pub description: String,
    pub amount_loss: Decimal,
}

/// Input for creating a packaging invoice
#[derive(Debug, Deserialize)]
pub struct CreatePackagingInvoiceInput {
    pub date: NaiveDate,
    pub no_of_crates: i32,
    pub cost_per_crate: Decimal,
}

impl ExpenseService {
    /// Create a new ExpenseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Expenses
    // ========================================================================

    /// Record an expense
    pub async fn record_expense(&self, input: RecordExpenseInput) -> AppResult<Expense> {
        if input.amount < Decimal::ZERO {
            return Err(AppError::validation("amount", "Amount cannot be negative"));
        }

        let row = sqlx::query_as::<_, (Uuid, chrono::DateTime<chrono::Utc>)>(
            "INSERT INTO expenses (date, description, category, amount)
             VALUES ($1, $2, $3, $4)
             RETURNING id, created_at",
        )
        .bind(input.date)
        .bind(&input.description)
        .bind(input.category.as_str())
        .bind(input.amount)
        .fetch_one(&self.db)
        .await?;

        Ok(Expense {
            id: row.0,
            date: input.date,
            description: input.description,
            category: input.category,
            amount: input.amount,
            created_at: row.1,
        })
    }

    /// List expenses, optionally restricted to a date range, newest first
    pub async fn list_expenses(&self, range: Option<DateRange>) -> AppResult<Vec<Expense>> {
        let rows = sqlx::query_as::<
            _,
            (Uuid, NaiveDate, String, String, Decimal, chrono::DateTime<chrono::Utc>),
        >(
            "SELECT id, date, description, category, amount, created_at FROM expenses
             WHERE ($1::date IS NULL OR date >= $1)
               AND ($2::date IS NULL OR date <= $2)
             ORDER BY date DESC, created_at DESC",
        )
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|(id, date, description, category, amount, created_at)| {
                Ok(Expense {
                    id,
                    date,
                    description,
                    category: ExpenseCategory::from_str(&category)
                        .map_err(AppError::Internal)?,
                    amount,
                    created_at,
                })
            })
            .collect()
    }

    /// Delete an expense
    pub async fn delete_expense(&self, expense_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(expense_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Expense".to_string()));
        }

        Ok(())
    }

    // ========================================================================
    // Damages
    // ========================================================================

    /// Record a damage loss
    pub async fn record_damage(&self, input: RecordDamageInput) -> AppResult<Damages> {
        if input.amount_loss < Decimal::ZERO {
            return Err(AppError::validation(
                "amount_loss",
                "Loss amount cannot be negative",
            ));
        }

        let row = sqlx::query_as::<_, (Uuid, chrono::DateTime<chrono::Utc>)>(
            "INSERT INTO damages (date, description, amount_loss)
             VALUES ($1, $2, $3)
             RETURNING id, created_at",
        )
        .bind(input.date)
        .bind(&input.description)
        .bind(input.amount_loss)
        .fetch_one(&self.db)
        .await?;

        Ok(Damages {
            id: row.0,
            date: input.date,
            description: input.description,
            amount_loss: input.amount_loss,
            created_at: row.1,
        })
    }

    /// List damage records, newest first
    pub async fn list_damages(&self, range: Option<DateRange>) -> AppResult<Vec<Damages>> {
        let rows = sqlx::query_as::<
            _,
            (Uuid, NaiveDate, String, Decimal, chrono::DateTime<chrono::Utc>),
        >(
            "SELECT id, date, description, amount_loss, created_at FROM damages
             WHERE ($1::date IS NULL OR date >= $1)
               AND ($2::date IS NULL OR date <= $2)
             ORDER BY date DESC, created_at DESC",
        )
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, date, description, amount_loss, created_at)| Damages {
                id,
                date,
                description,
                amount_loss,
                created_at,
            })
            .collect())
    }

    /// Delete a damage record
    pub async fn delete_damage(&self, damage_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM damages WHERE id = $1")
            .bind(damage_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Damage record".to_string()));
        }

        Ok(())
    }

    // ========================================================================
    // Packaging invoices
    // ========================================================================

    /// Create a packaging invoice. The total is derived, not accepted.
    pub async fn create_packaging_invoice(
        &self,
        input: CreatePackagingInvoiceInput,
    ) -> AppResult<PackagingInvoice> {
        validate_crate_count(input.no_of_crates)
            .map_err(|msg| AppError::validation("no_of_crates", msg))?;
        validate_price(input.cost_per_crate)
            .map_err(|msg| AppError::validation("cost_per_crate", msg))?;

        let total = round_money(packaging_total(input.no_of_crates, input.cost_per_crate));

        let row = sqlx::query_as::<_, (Uuid, chrono::DateTime<chrono::Utc>)>(
            "INSERT INTO packaging_invoices (date, no_of_crates, cost_per_crate, packaging_total)
             VALUES ($1, $2, $3, $4)
             RETURNING id, created_at",
        )
        .bind(input.date)
        .bind(input.no_of_crates)
        .bind(input.cost_per_crate)
        .bind(total)
        .fetch_one(&self.db)
        .await?;

        Ok(PackagingInvoice {
            id: row.0,
            date: input.date,
            no_of_crates: input.no_of_crates,
            cost_per_crate: input.cost_per_crate,
            packaging_total: total,
            created_at: row.1,
        })
    }

    /// List packaging invoices, newest first
    pub async fn list_packaging_invoices(&self) -> AppResult<Vec<PackagingInvoice>> {
        let rows = sqlx::query_as::<
            _,
            (Uuid, NaiveDate, i32, Decimal, Decimal, chrono::DateTime<chrono::Utc>),
        >(
            "SELECT id, date, no_of_crates, cost_per_crate, packaging_total, created_at
             FROM packaging_invoices
             ORDER BY date DESC, created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, date, no_of_crates, cost_per_crate, packaging_total, created_at)| {
                    PackagingInvoice {
                        id,
                        date,
                        no_of_crates,
                        cost_per_crate,
                        packaging_total,
                        created_at,
                    }
                },
            )
            .collect())
    }

    /// Delete a packaging invoice
    pub async fn delete_packaging_invoice(&self, invoice_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM packaging_invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Packaging invoice".to_string()));
        }

        Ok(())
    }
}
