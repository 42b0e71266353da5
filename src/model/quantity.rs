//! Cable quantities: exact decimals with at most three fractional digits.

use crate::error::LedgerError;
use rust_decimal::Decimal;

/// Fractional digits kept by `NUMERIC(12,3)`
pub const SCALE: u32 = 3;

/// Exclusive upper bound imposed by `NUMERIC(12,3)`
pub fn upper_bound() -> Decimal {
    Decimal::new(1_000_000_000, 0)
}

/// Check a caller-supplied quantity and return it normalized
///
/// `field` names the input in error messages. Zero is accepted only when
/// `allow_zero` is set; negatives never are.
pub fn validate(field: &str, value: Decimal, allow_zero: bool) -> Result<Decimal, LedgerError> {
    let value = value.normalize();
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LedgerError::validation(format!("{field} must not be negative")));
    }
    if value.is_zero() && !allow_zero {
        return Err(LedgerError::validation(format!("{field} must be greater than zero")));
    }
    if value.scale() > SCALE {
        return Err(LedgerError::validation(format!(
            "{field} allows at most {SCALE} decimal places"
        )));
    }
    if value >= upper_bound() {
        return Err(LedgerError::validation(format!("{field} is too large")));
    }
    Ok(value)
}
