//! Expense and damage models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An operating expense; contributes negatively to profit and loss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Expense classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Transport,
    Labour,
    Rent,
    Utilities,
    Commission,
    Misc,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Labour => "labour",
            ExpenseCategory::Rent => "rent",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Commission => "commission",
            ExpenseCategory::Misc => "misc",
        }
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transport" => Ok(ExpenseCategory::Transport),
            "labour" => Ok(ExpenseCategory::Labour),
            "rent" => Ok(ExpenseCategory::Rent),
            "utilities" => Ok(ExpenseCategory::Utilities),
            "commission" => Ok(ExpenseCategory::Commission),
            "misc" => Ok(ExpenseCategory::Misc),
            other => Err(format!("unknown expense category: {other}")),
        }
    }
}

/// A recorded stock loss (spoilage, spillage, transit damage)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Damages {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    /// Monetary value of the loss
    pub amount_loss: Decimal,
    pub created_at: DateTime<Utc>,
}
