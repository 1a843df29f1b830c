//! Vendor and customer service

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Customer, PurchaseVendor};
use shared::validation::{validate_contact_number, validate_rate};

use crate::error::{AppError, AppResult};

/// Service for the parties on both sides of the ledger
#[derive(Clone)]
pub struct PartyService {
    db: PgPool,
}

/// Input for creating a vendor
#[derive(Debug, Deserialize)]
pub struct CreateVendorInput {
    pub name: String,
    pub contact_number: Option<String>,
    pub area: Option<String>,
}

/// Input for creating a customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub contact_number: Option<String>,
    pub area: Option<String>,
    /// Commission rate override as a fraction; None uses the configured default
    pub commission_rate: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct VendorRow {
    id: Uuid,
    name: String,
    contact_number: Option<String>,
    area: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<VendorRow> for PurchaseVendor {
    fn from(row: VendorRow) -> Self {
        PurchaseVendor {
            id: row.id,
            name: row.name,
            contact_number: row.contact_number,
            area: row.area,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    contact_number: Option<String>,
    area: Option<String>,
    commission_rate: Option<Decimal>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            contact_number: row.contact_number,
            area: row.area,
            commission_rate: row.commission_rate,
            created_at: row.created_at,
        }
    }
}

impl PartyService {
    /// Create a new PartyService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Vendors
    // ========================================================================

    /// Create a purchase vendor
    pub async fn create_vendor(&self, input: CreateVendorInput) -> AppResult<PurchaseVendor> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Vendor name cannot be empty"));
        }
        if let Some(contact) = &input.contact_number {
            validate_contact_number(contact)
                .map_err(|msg| AppError::validation("contact_number", msg))?;
        }

        let row = sqlx::query_as::<_, VendorRow>(
            "INSERT INTO purchase_vendors (name, contact_number, area)
             VALUES ($1, $2, $3)
             RETURNING id, name, contact_number, area, created_at",
        )
        .bind(&input.name)
        .bind(&input.contact_number)
        .bind(&input.area)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a vendor by id
    pub async fn get_vendor(&self, vendor_id: Uuid) -> AppResult<PurchaseVendor> {
        let row = sqlx::query_as::<_, VendorRow>(
            "SELECT id, name, contact_number, area, created_at
             FROM purchase_vendors WHERE id = $1",
        )
        .bind(vendor_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor".to_string()))?;

        Ok(row.into())
    }

    /// List vendors, alphabetically
    pub async fn list_vendors(&self) -> AppResult<Vec<PurchaseVendor>> {
        let rows = sqlx::query_as::<_, VendorRow>(
            "SELECT id, name, contact_number, area, created_at
             FROM purchase_vendors ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PurchaseVendor::from).collect())
    }

    /// Delete a vendor. Fails while invoices still reference them.
    pub async fn delete_vendor(&self, vendor_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM purchase_vendors WHERE id = $1")
            .bind(vendor_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vendor".to_string()));
        }

        Ok(())
    }

    // ========================================================================
    // Customers
    // ========================================================================

    /// Create a customer
    pub async fn create_customer(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Customer name cannot be empty"));
        }
        if let Some(contact) = &input.contact_number {
            validate_contact_number(contact)
                .map_err(|msg| AppError::validation("contact_number", msg))?;
        }
        if let Some(rate) = input.commission_rate {
            validate_rate(rate).map_err(|msg| AppError::validation("commission_rate", msg))?;
        }

        let row = sqlx::query_as::<_, CustomerRow>(
            "INSERT INTO customers (name, contact_number, area, commission_rate)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, contact_number, area, commission_rate, created_at",
        )
        .bind(&input.name)
        .bind(&input.contact_number)
        .bind(&input.area)
        .bind(input.commission_rate)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a customer by id
    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, contact_number, area, commission_rate, created_at
             FROM customers WHERE id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// List customers, alphabetically
    pub async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, contact_number, area, commission_rate, created_at
             FROM customers ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Update a customer's commission rate override. Takes effect for
    /// invoices created afterwards; existing invoices keep their totals.
    pub async fn set_customer_commission_rate(
        &self,
        customer_id: Uuid,
        commission_rate: Option<Decimal>,
    ) -> AppResult<Customer> {
        if let Some(rate) = commission_rate {
            validate_rate(rate).map_err(|msg| AppError::validation("commission_rate", msg))?;
        }

        let row = sqlx::query_as::<_, CustomerRow>(
            "UPDATE customers SET commission_rate = $1 WHERE id = $2
             RETURNING id, name, contact_number, area, commission_rate, created_at",
        )
        .bind(commission_rate)
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// Delete a customer. Fails while invoices still reference them.
    pub async fn delete_customer(&self, customer_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(customer_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        Ok(())
    }
}
