//! Stock movement arithmetic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of a stock movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MovementKind {
    Addition,
    Subtraction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("Insufficient stock for this operation.")]
    Insufficient,
    #[error("stock level overflow")]
    Overflow,
}

/// Computes the level a movement would produce, without mutating anything.
/// Callers persist the movement and the new level in one transaction, or
/// neither. Quantity must already be validated positive.
pub fn apply(level: i32, kind: MovementKind, quantity: i32) -> Result<i32, StockError> {
    debug_assert!(quantity > 0);
    match kind {
        MovementKind::Addition => level.checked_add(quantity).ok_or(StockError::Overflow),
        MovementKind::Subtraction => {
            if quantity > level {
                Err(StockError::Insufficient)
            } else {
                Ok(level - quantity)
            }
        }
    }
}

/// Whether a freshly persisted level should raise a low-stock event.
pub fn is_low(level: i32, threshold: i32) -> bool {
    level <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition() {
        assert_eq!(apply(0, MovementKind::Addition, 10).unwrap(), 10);
        assert_eq!(apply(5, MovementKind::Addition, 1).unwrap(), 6);
    }

    #[test]
    fn test_subtraction_within_stock() {
        assert_eq!(apply(5, MovementKind::Subtraction, 3).unwrap(), 2);
        assert_eq!(apply(5, MovementKind::Subtraction, 5).unwrap(), 0);
    }

    #[test]
    fn test_subtraction_beyond_stock_rejected() {
        let level = 2;
        assert_eq!(
            apply(level, MovementKind::Subtraction, 3),
            Err(StockError::Insufficient)
        );
        // the caller never persists anything on failure, so the level stands
        assert_eq!(level, 2);
    }

    #[test]
    fn test_addition_then_equal_subtraction_round_trips() {
        let after_add = apply(7, MovementKind::Addition, 4).unwrap();
        assert_eq!(apply(after_add, MovementKind::Subtraction, 4).unwrap(), 7);
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            apply(i32::MAX, MovementKind::Addition, 1),
            Err(StockError::Overflow)
        );
    }

    #[test]
    fn test_low_stock_threshold() {
        assert!(is_low(10, 10));
        assert!(is_low(0, 10));
        assert!(!is_low(11, 10));
    }
}
