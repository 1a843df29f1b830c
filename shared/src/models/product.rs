//! Product and category models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product category (e.g. "Mango", "Banana")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A traded product with its live stock position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    /// Default selling price per kg
    pub unit_price: Decimal,
    /// Stock on hand in kg; never negative
    pub current_stock: Decimal,
    /// Low-stock alert threshold in kg
    pub threshold: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product is at or below its low-stock threshold
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.threshold
    }

    pub fn stock_status(&self) -> StockStatus {
        if self.current_stock == Decimal::ZERO {
            StockStatus::Out
        } else if self.is_low_stock() {
            StockStatus::Low
        } else {
            StockStatus::In
        }
    }
}

/// Stock position bucket used by inventory filters and reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    In,
    Low,
    Out,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::In => write!(f, "In Stock"),
            StockStatus::Low => write!(f, "Low Stock"),
            StockStatus::Out => write!(f, "Out of Stock"),
        }
    }
}
