//! Derivation engine for invoice financials
//!
//! Pure functions that turn raw line items and payments into the derived
//! monetary fields the rest of the system consumes: line totals, invoice
//! net totals, the cash-cutting and commission chains, due balances and
//! remaining lot quantities. All arithmetic is fixed-point `Decimal`;
//! rounding happens once, at persistence, via [`round_money`].

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::types::RottenPolicy;

/// Validation failures raised while deriving invoice fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    #[error("{0} cannot be negative")]
    Negative(&'static str),

    #[error("{0} must be between 0 and 100")]
    PercentOutOfRange(&'static str),

    #[error("line total cannot be negative")]
    NegativeLineTotal,
}

// ============================================================================
// Line totals
// ============================================================================

/// Total for one purchased product line.
///
/// Damage and discount are applied as successive percentage reductions on
/// quantity × price, then the loading/unloading charge is added. Whether the
/// recorded rotten weight is deducted depends on the [`RottenPolicy`].
pub fn purchase_line_total(
    quantity: Decimal,
    price: Decimal,
    damage_percent: Decimal,
    discount_percent: Decimal,
    rotten: Decimal,
    loading_unloading: Decimal,
    policy: RottenPolicy,
) -> Result<Decimal, DerivationError> {
    check_non_negative("quantity", quantity)?;
    check_non_negative("price", price)?;
    check_non_negative("rotten", rotten)?;
    check_non_negative("loading_unloading", loading_unloading)?;
    check_percent("damage_percent", damage_percent)?;
    check_percent("discount_percent", discount_percent)?;

    let base = quantity * price * percent_factor(damage_percent) * percent_factor(discount_percent);
    Ok(base - rotten_adjustment(rotten, price, policy) + loading_unloading)
}

/// Total for one sold product line: net weight × price × (1 − discount/100).
pub fn sales_line_total(
    net_weight: Decimal,
    price: Decimal,
    discount_percent: Decimal,
    rotten: Decimal,
    policy: RottenPolicy,
) -> Result<Decimal, DerivationError> {
    check_non_negative("net_weight", net_weight)?;
    check_non_negative("price", price)?;
    check_non_negative("rotten", rotten)?;
    check_percent("discount_percent", discount_percent)?;

    let base = net_weight * price * percent_factor(discount_percent);
    Ok(base - rotten_adjustment(rotten, price, policy))
}

/// Sum of line totals for an invoice.
///
/// An empty line set yields zero. A negative line total is rejected rather
/// than silently folded into the sum.
pub fn invoice_net_total(line_totals: &[Decimal]) -> Result<Decimal, DerivationError> {
    if line_totals.iter().any(|t| *t < Decimal::ZERO) {
        return Err(DerivationError::NegativeLineTotal);
    }
    Ok(line_totals.iter().sum())
}

// ============================================================================
// Invoice-level chains
// ============================================================================

/// Cash-handling commission deducted from purchase invoices (rate is a
/// fraction, e.g. 0.02 for the standard 2%)
pub fn cash_cutting(net_total: Decimal, rate: Decimal) -> Decimal {
    net_total * rate
}

pub fn net_total_after_cash_cutting(net_total: Decimal, rate: Decimal) -> Decimal {
    net_total - cash_cutting(net_total, rate)
}

/// Commission added on top of a sales invoice's net total
pub fn sales_commission(net_total: Decimal, rate: Decimal) -> Decimal {
    net_total * rate
}

pub fn net_total_after_commission(net_total: Decimal, rate: Decimal) -> Decimal {
    net_total + sales_commission(net_total, rate)
}

/// Crate packaging cost for an invoice
pub fn packaging_total(no_of_crates: i32, cost_per_crate: Decimal) -> Decimal {
    Decimal::from(no_of_crates) * cost_per_crate
}

pub fn net_total_after_packaging(after_commission: Decimal, packaging: Decimal) -> Decimal {
    after_commission + packaging
}

// ============================================================================
// Balances
// ============================================================================

/// Outstanding balance on an invoice. Negative means overpayment; the value
/// is surfaced as-is, never clamped.
pub fn due_amount(total: Decimal, paid: Decimal) -> Decimal {
    total - paid
}

/// Quantity of a purchased lot still unsold. Not clamped to zero here;
/// clamping, if wanted, is a display decision.
pub fn remaining_quantity(purchased: Decimal, sold: Decimal) -> Decimal {
    purchased - sold
}

/// Round a monetary value to two decimal places, half away from zero.
/// Applied at the point of persistence, not at intermediate steps.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// Helpers
// ============================================================================

fn percent_factor(percent: Decimal) -> Decimal {
    Decimal::ONE - percent / Decimal::ONE_HUNDRED
}

fn rotten_adjustment(rotten: Decimal, price: Decimal, policy: RottenPolicy) -> Decimal {
    match policy {
        RottenPolicy::Recorded => Decimal::ZERO,
        RottenPolicy::Deducted => rotten * price,
    }
}

fn check_non_negative(field: &'static str, value: Decimal) -> Result<(), DerivationError> {
    if value < Decimal::ZERO {
        return Err(DerivationError::Negative(field));
    }
    Ok(())
}

fn check_percent(field: &'static str, value: Decimal) -> Result<(), DerivationError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(DerivationError::PercentOutOfRange(field));
    }
    Ok(())
}
