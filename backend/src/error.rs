//! Error handling for the Produce Trade Ledger
//!
//! Engine errors are typed and propagate unmodified to the caller; the
//! presentation layer that links against this crate decides how to render
//! or log them.

use shared::DerivationError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Insufficient lot quantity: {0}")]
    InsufficientLotQuantity(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Derivation errors from the shared engine
    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Convenience constructor for field-level validation failures
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for services
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_error_converts() {
        let err: AppError = DerivationError::NegativeLineTotal.into();
        assert!(matches!(err, AppError::Derivation(_)));
    }

    #[test]
    fn test_validation_constructor() {
        let err = AppError::validation("quantity", "Quantity cannot be negative");
        assert_eq!(
            err.to_string(),
            "Validation error: Quantity cannot be negative"
        );
    }
}
