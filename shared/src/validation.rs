//! Validation utilities for the Produce Trade Ledger
//!
//! Input checks applied before anything reaches the derivation engine or
//! storage. Callers map the static messages into their own error types.

use rust_decimal::Decimal;

// ============================================================================
// Quantity and money validations
// ============================================================================

/// Validate a quantity/weight in kg
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Validate a unit price
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate a percentage value (damage, discount)
pub fn validate_percent(percent: Decimal) -> Result<(), &'static str> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err("Percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate a commission or cash-cutting rate expressed as a fraction
pub fn validate_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err("Rate must be between 0 and 1");
    }
    Ok(())
}

/// Validate a crate count
pub fn validate_crate_count(no_of_crates: i32) -> Result<(), &'static str> {
    if no_of_crates < 0 {
        return Err("Crate count cannot be negative");
    }
    Ok(())
}

/// Validate a payment amount
pub fn validate_payment_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Payment amount must be positive");
    }
    Ok(())
}

// ============================================================================
// Document number validations
// ============================================================================

/// Validate a lot number
/// Format: LOT-YYYY-NNNN (e.g. LOT-2025-0042)
pub fn validate_lot_number(lot_number: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = lot_number.split('-').collect();

    if parts.len() != 3 {
        return Err("Lot number must be in format LOT-YYYY-NNNN");
    }
    if parts[0] != "LOT" {
        return Err("Lot number must start with 'LOT'");
    }
    if parts[1].len() != 4 || !parts[1].chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid year in lot number");
    }
    if parts[2].len() != 4 || !parts[2].chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid sequence number in lot number");
    }

    Ok(())
}

/// Generate a lot number
pub fn generate_lot_number(year: i32, sequence: i32) -> String {
    format!("LOT-{}-{:04}", year, sequence)
}

/// Validate an invoice number: 3-20 characters, uppercase alphanumeric with
/// dashes or slashes (e.g. "PI-2025-0117", "SI/481")
pub fn validate_invoice_number(invoice_number: &str) -> Result<(), &'static str> {
    if invoice_number.len() < 3 {
        return Err("Invoice number must be at least 3 characters");
    }
    if invoice_number.len() > 20 {
        return Err("Invoice number must be at most 20 characters");
    }
    if !invoice_number
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '/')
    {
        return Err("Invoice number must be uppercase alphanumeric with '-' or '/'");
    }
    Ok(())
}

// ============================================================================
// Contact validations
// ============================================================================

/// Validate an Indian mobile number
/// Accepts: 9812345670, 98123-45670, +919812345670
pub fn validate_contact_number(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Domestic: 10 digits starting 6-9
    if digits.len() == 10 && digits.starts_with(['6', '7', '8', '9']) {
        return Ok(());
    }
    // With country code: 12 digits starting 91
    if digits.len() == 12 && digits.starts_with("91") {
        return Ok(());
    }

    Err("Invalid contact number format")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ========================================================================
    // Quantity and money validation tests
    // ========================================================================

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(dec("0")).is_ok());
        assert!(validate_quantity(dec("120.5")).is_ok());
        assert!(validate_quantity(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_percent_bounds() {
        assert!(validate_percent(dec("0")).is_ok());
        assert!(validate_percent(dec("100")).is_ok());
        assert!(validate_percent(dec("100.01")).is_err());
        assert!(validate_percent(dec("-1")).is_err());
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate(dec("0.02")).is_ok());
        assert!(validate_rate(dec("1")).is_ok());
        assert!(validate_rate(dec("1.5")).is_err());
        assert!(validate_rate(dec("-0.02")).is_err());
    }

    #[test]
    fn test_validate_crate_count() {
        assert!(validate_crate_count(0).is_ok());
        assert!(validate_crate_count(250).is_ok());
        assert!(validate_crate_count(-1).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(dec("500")).is_ok());
        assert!(validate_payment_amount(dec("0")).is_err());
        assert!(validate_payment_amount(dec("-10")).is_err());
    }

    // ========================================================================
    // Document number validation tests
    // ========================================================================

    #[test]
    fn test_validate_lot_number_valid() {
        assert!(validate_lot_number("LOT-2025-0042").is_ok());
        assert!(validate_lot_number("LOT-2024-9999").is_ok());
    }

    #[test]
    fn test_validate_lot_number_invalid() {
        assert!(validate_lot_number("LOT-25-0042").is_err());
        assert!(validate_lot_number("BATCH-2025-0042").is_err());
        assert!(validate_lot_number("LOT20250042").is_err());
        assert!(validate_lot_number("LOT-2025-042").is_err());
    }

    #[test]
    fn test_generate_lot_number() {
        assert_eq!(generate_lot_number(2025, 42), "LOT-2025-0042");
        assert!(validate_lot_number(&generate_lot_number(2025, 1)).is_ok());
    }

    #[test]
    fn test_validate_invoice_number() {
        assert!(validate_invoice_number("PI-2025-0117").is_ok());
        assert!(validate_invoice_number("SI/481").is_ok());
        assert!(validate_invoice_number("AB").is_err()); // too short
        assert!(validate_invoice_number("pi-2025-0117").is_err()); // lowercase
        assert!(validate_invoice_number("PI 2025").is_err()); // space
    }

    // ========================================================================
    // Contact validation tests
    // ========================================================================

    #[test]
    fn test_validate_contact_number_valid() {
        assert!(validate_contact_number("9812345670").is_ok());
        assert!(validate_contact_number("98123-45670").is_ok());
        assert!(validate_contact_number("+919812345670").is_ok());
        assert!(validate_contact_number("919812345670").is_ok());
    }

    #[test]
    fn test_validate_contact_number_invalid() {
        assert!(validate_contact_number("12345").is_err());
        assert!(validate_contact_number("1234567890").is_err()); // starts with 1
        assert!(validate_contact_number("abcdefghij").is_err());
    }
}
