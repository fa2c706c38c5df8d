//! Monetary amount rules.
//!
//! Amounts are `NUMERIC(10, 2)` in the store; the payment gateway wants
//! integer minor units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Maximum number of decimal places a monetary amount may carry.
pub const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount must not be negative")]
    Negative,
    #[error("amount has more than two decimal places")]
    TooPrecise,
    #[error("amount out of range")]
    OutOfRange,
}

/// Rejects negative amounts and sub-cent precision.
pub fn validate_amount(amount: Decimal) -> Result<(), MoneyError> {
    if amount.is_sign_negative() {
        return Err(MoneyError::Negative);
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(MoneyError::TooPrecise);
    }
    Ok(())
}

/// Converts a major-unit amount to gateway minor units (cents).
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    validate_amount(amount)?;
    (amount * Decimal::from(100))
        .trunc()
        .to_i64()
        .ok_or(MoneyError::OutOfRange)
}

/// Extended price of one order line.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Decimal::new(1999, 2)).is_ok());
        assert!(validate_amount(Decimal::ZERO).is_ok());
        assert_eq!(validate_amount(Decimal::new(-1, 2)), Err(MoneyError::Negative));
        assert_eq!(validate_amount(Decimal::new(12345, 3)), Err(MoneyError::TooPrecise));
        // 1.500 normalizes to 1.5 and passes
        assert!(validate_amount(Decimal::new(1500, 3)).is_ok());
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(1999, 2)).unwrap(), 1999);
        assert_eq!(to_minor_units(Decimal::new(5, 0)).unwrap(), 500);
        assert!(to_minor_units(Decimal::new(-100, 2)).is_err());
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(Decimal::new(1050, 2), 3), Decimal::new(3150, 2));
    }
}
