//! Notification channel.
//!
//! Fire-and-forget fan-out of domain events. A failed publish is logged and
//! otherwise ignored; notification never fails a request.

use async_trait::async_trait;

use crate::domain::events::DomainEvent;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: DomainEvent);
}

/// Publishes events as JSON on NATS subjects.
pub struct NatsNotifier {
    client: async_nats::Client,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn notify(&self, event: DomainEvent) {
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(subject, error = %e, "failed to encode event");
                return;
            }
        };
        if let Err(e) = self.client.publish(subject.to_string(), payload.into()).await {
            tracing::warn!(subject, error = %e, "failed to publish event");
        }
    }
}

/// Stands in when no NATS_URL is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, event: DomainEvent) {
        tracing::debug!(subject = event.subject(), "event dropped, no notifier configured");
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records events for assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<DomainEvent>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, event: DomainEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_events_are_recorded_once_per_notify() {
        let notifier = RecordingNotifier::default();
        notifier
            .notify(DomainEvent::LowStock {
                product_id: Uuid::nil(),
                name: "Widget".into(),
                stock_level: 2,
            })
            .await;
        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subject(), "store.stock.low");
    }
}
