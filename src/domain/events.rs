//! Domain events published on the notification channel after a commit.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::stock::MovementKind;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    StockAdjusted {
        product_id: Uuid,
        movement_type: MovementKind,
        quantity: i32,
        stock_level: i32,
    },
    LowStock {
        product_id: Uuid,
        name: String,
        stock_level: i32,
    },
    OrderConfirmed {
        order_id: Uuid,
        user_id: Uuid,
        email: String,
        total: Decimal,
    },
}

impl DomainEvent {
    /// Subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            DomainEvent::StockAdjusted { .. } => "store.stock.adjusted",
            DomainEvent::LowStock { .. } => "store.stock.low",
            DomainEvent::OrderConfirmed { .. } => "store.order.confirmed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects() {
        let event = DomainEvent::LowStock {
            product_id: Uuid::nil(),
            name: "Widget".into(),
            stock_level: 3,
        };
        assert_eq!(event.subject(), "store.stock.low");
    }

    #[test]
    fn test_payload_shape() {
        let event = DomainEvent::StockAdjusted {
            product_id: Uuid::nil(),
            movement_type: MovementKind::Subtraction,
            quantity: 3,
            stock_level: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "stock_adjusted");
        assert_eq!(json["movement_type"], "subtraction");
        assert_eq!(json["stock_level"], 2);
    }
}
