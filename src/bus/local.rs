//! In-process event bus used by tests and as a safe default when no broker is
//! configured. Same `EventBus` trait as the NATS-backed adapter, so the rest of the
//! core is adapter-agnostic.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{EventBus, Subscription};
use crate::error::BusError;
use crate::events::ChatEvent;

const SUBSCRIBER_QUEUE_DEPTH: usize = 1024;

struct Entry {
    topic: String,
    sender: mpsc::Sender<ChatEvent>,
}

#[derive(Default)]
pub struct LocalBus {
    subs: Mutex<HashMap<u64, Entry>>,
    next_id: AtomicU64,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventBus for LocalBus {
    async fn publish(&self, topic: &str, event: ChatEvent) -> Result<(), BusError> {
        let subs = self.subs.lock().unwrap_or_else(|e| e.into_inner());
        for entry in subs.values() {
            if entry.topic == topic {
                // Non-blocking: a slow or dropped subscriber never stalls the publisher.
                let _ = entry.sender.try_send(event.clone());
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subs = self.subs.lock().unwrap_or_else(|e| e.into_inner());
        subs.insert(
            id,
            Entry {
                topic: topic.to_string(),
                sender: tx,
            },
        );
        Ok(Subscription { id, receiver: rx })
    }

    async fn unsubscribe(&self, subscription_id: u64) -> Result<(), BusError> {
        let mut subs = self.subs.lock().unwrap_or_else(|e| e.into_inner());
        subs.remove(&subscription_id);
        Ok(())
    }

    async fn drain(&self) -> Result<(), BusError> {
        let mut subs = self.subs.lock().unwrap_or_else(|e| e.into_inner());
        subs.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(room: &str) -> ChatEvent {
        ChatEvent::SystemMessage {
            room_id: room.to_string(),
            message: "hi".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn delivers_to_matching_subscribers_only() {
        let bus = LocalBus::new();
        let mut sub_a = bus.subscribe("topic.a").await.unwrap();
        let mut sub_b = bus.subscribe("topic.b").await.unwrap();

        bus.publish("topic.a", event("r1")).await.unwrap();

        assert!(sub_a.receiver.try_recv().is_ok());
        assert!(sub_b.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = LocalBus::new();
        let sub = bus.subscribe("topic.a").await.unwrap();
        bus.unsubscribe(sub.id).await.unwrap();

        bus.publish("topic.a", event("r1")).await.unwrap();
        // sub was dropped along with its receiver; publish must not panic or error.
    }

    #[tokio::test]
    async fn fan_out_to_multiple_subscribers_of_same_topic() {
        let bus = LocalBus::new();
        let mut s1 = bus.subscribe("topic.a").await.unwrap();
        let mut s2 = bus.subscribe("topic.a").await.unwrap();

        bus.publish("topic.a", event("r1")).await.unwrap();

        assert!(s1.receiver.try_recv().is_ok());
        assert!(s2.receiver.try_recv().is_ok());
    }
}
