//! In-process event bus backed by a tokio broadcast channel.

use async_trait::async_trait;
use tokio::sync::broadcast;

use schemadb_types::{EventBus, EventBusError};

/// A published message as seen by subscribers.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// `EventBus` over `tokio::sync::broadcast`. Useful in tests and for
/// wiring in-process consumers; a send with no live subscribers is not a
/// failure (publication is at-most-once, best-effort).
pub struct BroadcastBus {
    tx: broadcast::Sender<BusMessage>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventBus for BroadcastBus {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), EventBusError> {
        let _ = self.tx.send(BusMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_messages() {
        let bus = BroadcastBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish("schema.events.orders", b"hello").await.unwrap();

        let message = rx.recv().await.unwrap();
        assert_eq!(message.topic, "schema.events.orders");
        assert_eq!(message.payload, b"hello");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = BroadcastBus::new(8);
        assert!(bus.publish("schema.events.orders", b"x").await.is_ok());
    }
}
