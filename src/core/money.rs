//! Fixed-point money helpers.
//!
//! Every monetary value is a `rust_decimal::Decimal` with at most two
//! decimal places. Rounding happens only when a percentage is turned into
//! an amount, never on intermediate sums.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{AppError, Result};

/// Decimal places kept for every monetary amount
pub const SCALE: u32 = 2;

/// Smallest representable amount (0.01)
pub const ONE_CENT: Decimal = Decimal::from_parts(1, 0, 0, false, SCALE);

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round to two decimal places, half away from zero (0.005 -> 0.01)
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount × percentage / 100`, rounded to cents
pub fn percentage_of(amount: Decimal, percentage: Decimal) -> Decimal {
    round2(amount * percentage / HUNDRED)
}

/// Render an amount with exactly two decimals ("120.00")
pub fn format(amount: Decimal) -> String {
    let mut rounded = round2(amount);
    rounded.rescale(SCALE);
    rounded.to_string()
}

/// Reject negative amounts and amounts with sub-cent precision
pub fn validate_amount(field: &str, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(AppError::validation(format!(
            "{} cannot be negative, got: {}",
            field, amount
        )));
    }

    if amount.normalize().scale() > SCALE {
        return Err(AppError::validation(format!(
            "{} must have at most {} decimal places, got: {}",
            field, SCALE, amount
        )));
    }

    Ok(())
}

/// Like [`validate_amount`] but zero is rejected too
pub fn validate_positive_amount(field: &str, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation(format!(
            "{} must be greater than zero, got: {}",
            field, amount
        )));
    }

    validate_amount(field, amount)
}

/// Percentages live in 0..=100
pub fn validate_percentage(field: &str, percentage: Decimal) -> Result<()> {
    if percentage < Decimal::ZERO || percentage > HUNDRED {
        return Err(AppError::validation(format!(
            "{} must be between 0 and 100, got: {}",
            field, percentage
        )));
    }

    Ok(())
}
