//! Publish/subscribe event bus (C5). The rest of the core talks to `dyn EventBus`
//! only; production wires up [`nats::NatsBus`], tests use [`local::LocalBus`].

pub mod local;
pub mod nats;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BusError;
use crate::events::ChatEvent;

/// A live subscription. Dropping it does not unsubscribe; call
/// [`EventBus::unsubscribe`] explicitly so teardown order is always visible at the
/// call site (mirrors how rooms own and release their own subscriptions).
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::Receiver<ChatEvent>,
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, topic: &str, event: ChatEvent) -> Result<(), BusError>;

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError>;

    async fn unsubscribe(&self, subscription_id: u64) -> Result<(), BusError>;

    /// Flush pending publishes, stop delivering callbacks, release every subscription.
    async fn drain(&self) -> Result<(), BusError>;
}
