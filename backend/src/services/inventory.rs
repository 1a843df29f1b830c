//! Inventory service for categories, products and stock positions

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Category, Product, StockStatus};
use shared::validation::{validate_price, validate_quantity};

use crate::error::{AppError, AppResult};

/// Inventory service for managing products and their stock levels
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub category_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub threshold: Decimal,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub unit_price: Option<Decimal>,
    pub threshold: Option<Decimal>,
}

/// Filters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the product name
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub stock_status: Option<StockStatus>,
}

/// Row shape shared by all product queries
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    category_id: Uuid,
    name: String,
    unit_price: Decimal,
    current_stock: Decimal,
    threshold: Decimal,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            unit_price: row.unit_price,
            current_stock: row.current_stock,
            threshold: row.threshold,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, category_id, name, unit_price, current_stock, threshold, created_at, updated_at";

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Create a category
    pub async fn create_category(&self, name: &str) -> AppResult<Category> {
        if name.trim().is_empty() {
            return Err(AppError::validation("name", "Category name cannot be empty"));
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("category name".to_string()));
        }

        let row = sqlx::query_as::<_, (Uuid, String, chrono::DateTime<chrono::Utc>)>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        Ok(Category {
            id: row.0,
            name: row.1,
            created_at: row.2,
        })
    }

    /// List all categories, alphabetically
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, (Uuid, String, chrono::DateTime<chrono::Utc>)>(
            "SELECT id, name, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: r.0,
                name: r.1,
                created_at: r.2,
            })
            .collect())
    }

    // ========================================================================
    // Products
    // ========================================================================

    /// Create a product with zero opening stock
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Product name cannot be empty"));
        }
        validate_price(input.unit_price).map_err(|msg| AppError::validation("unit_price", msg))?;
        validate_quantity(input.threshold).map_err(|msg| AppError::validation("threshold", msg))?;

        let category_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
        )
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await?;

        if !category_exists {
            return Err(AppError::NotFound("Category".to_string()));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (category_id, name, unit_price, threshold)
             VALUES ($1, $2, $3, $4)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.category_id)
        .bind(&input.name)
        .bind(input.unit_price)
        .bind(input.threshold)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Update a product's descriptive fields. Stock is never set directly;
    /// it only moves through invoice mutations.
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(product_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let category_id = input.category_id.unwrap_or(existing.category_id);
        let unit_price = input.unit_price.unwrap_or(existing.unit_price);
        let threshold = input.threshold.unwrap_or(existing.threshold);

        if name.trim().is_empty() {
            return Err(AppError::validation("name", "Product name cannot be empty"));
        }
        validate_price(unit_price).map_err(|msg| AppError::validation("unit_price", msg))?;
        validate_quantity(threshold).map_err(|msg| AppError::validation("threshold", msg))?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products
             SET name = $1, category_id = $2, unit_price = $3, threshold = $4, updated_at = now()
             WHERE id = $5
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&name)
        .bind(category_id)
        .bind(unit_price)
        .bind(threshold)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete a product. Fails while any invoice line still references it.
    pub async fn delete_product(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    /// List products with optional search, category and stock-status filters
    pub async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
               AND ($2::uuid IS NULL OR category_id = $2)
             ORDER BY name"
        ))
        .bind(filter.search.as_deref())
        .bind(filter.category_id)
        .fetch_all(&self.db)
        .await?;

        let mut products: Vec<Product> = rows.into_iter().map(Product::from).collect();

        if let Some(status) = filter.stock_status {
            products.retain(|p| p.stock_status() == status);
        }

        Ok(products)
    }

    /// Products at or below their low-stock threshold
    pub async fn low_stock_products(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE current_stock <= threshold
             ORDER BY current_stock ASC"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
