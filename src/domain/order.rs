//! Order creation invariants and the status state machine.
//!
//! PENDING is the only initial state. PROCESSING is reachable solely through
//! a confirmed successful payment; fulfillment and cancellation arrive as
//! administrative transitions from outside the payment flow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order must have at least one item.")]
    NoItems,
    #[error("order has already been paid")]
    AlreadyPaid,
    #[error("order is cancelled")]
    Cancelled,
    #[error("cannot move order from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    /// Whether a payment confirmation may begin against this status.
    pub fn ensure_payable(self) -> Result<(), OrderError> {
        match self {
            OrderStatus::Pending => Ok(()),
            OrderStatus::Cancelled => Err(OrderError::Cancelled),
            OrderStatus::Processing | OrderStatus::Shipped | OrderStatus::Delivered => {
                Err(OrderError::AlreadyPaid)
            }
        }
    }

    /// The transition applied by a confirmed successful payment.
    pub fn paid(self) -> Result<OrderStatus, OrderError> {
        self.ensure_payable()?;
        Ok(OrderStatus::Processing)
    }

    /// Administrative transitions: cancellation of an unpaid order and
    /// fulfillment of a paid one. Everything else is rejected.
    pub fn transition(self, to: OrderStatus) -> Result<OrderStatus, OrderError> {
        use OrderStatus::*;
        let legal = matches!(
            (self, to),
            (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Delivered)
                | (Shipped, Delivered)
        );
        if legal {
            Ok(to)
        } else {
            Err(OrderError::InvalidTransition { from: self, to })
        }
    }
}

/// Line as captured at order time. The unit price is read from the product
/// row when the order is created and never tracks later price edits.
#[derive(Clone, Debug)]
pub struct NewItem {
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// An order with no items must never persist.
pub fn ensure_has_items<T>(items: &[T]) -> Result<(), OrderError> {
    if items.is_empty() {
        Err(OrderError::NoItems)
    } else {
        Ok(())
    }
}

/// Order total derived from the captured lines, never from caller input.
pub fn compute_total(items: &[NewItem]) -> Decimal {
    items
        .iter()
        .map(|i| money::line_total(i.unit_price, i.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_transitions_pending_to_processing() {
        assert_eq!(OrderStatus::Pending.paid().unwrap(), OrderStatus::Processing);
    }

    #[test]
    fn test_second_confirmation_rejected() {
        let status = OrderStatus::Pending.paid().unwrap();
        assert_eq!(status.paid(), Err(OrderError::AlreadyPaid));
        assert_eq!(OrderStatus::Shipped.paid(), Err(OrderError::AlreadyPaid));
        assert_eq!(OrderStatus::Delivered.paid(), Err(OrderError::AlreadyPaid));
    }

    #[test]
    fn test_cancelled_order_not_payable() {
        assert_eq!(
            OrderStatus::Cancelled.ensure_payable(),
            Err(OrderError::Cancelled)
        );
    }

    #[test]
    fn test_administrative_transitions() {
        assert_eq!(
            OrderStatus::Pending.transition(OrderStatus::Cancelled).unwrap(),
            OrderStatus::Cancelled
        );
        assert_eq!(
            OrderStatus::Processing.transition(OrderStatus::Shipped).unwrap(),
            OrderStatus::Shipped
        );
        assert_eq!(
            OrderStatus::Shipped.transition(OrderStatus::Delivered).unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn test_processing_unreachable_except_by_payment() {
        assert!(OrderStatus::Pending.transition(OrderStatus::Processing).is_err());
        assert!(OrderStatus::Cancelled.transition(OrderStatus::Processing).is_err());
        assert!(OrderStatus::Delivered.transition(OrderStatus::Processing).is_err());
    }

    #[test]
    fn test_terminal_states_stay_put() {
        assert!(OrderStatus::Cancelled.transition(OrderStatus::Shipped).is_err());
        assert!(OrderStatus::Delivered.transition(OrderStatus::Shipped).is_err());
    }

    #[test]
    fn test_empty_order_rejected() {
        let none: [NewItem; 0] = [];
        assert_eq!(ensure_has_items(&none), Err(OrderError::NoItems));
        assert!(ensure_has_items(&[1]).is_ok());
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let items = vec![
            NewItem { quantity: 2, unit_price: Decimal::new(1050, 2) },
            NewItem { quantity: 1, unit_price: Decimal::new(499, 2) },
        ];
        assert_eq!(compute_total(&items), Decimal::new(2599, 2));
    }
}
