//! NATS-backed event bus adapter. NATS gives us subject-based pub/sub with
//! segment-level wildcards for free; we only ever publish/subscribe to concrete
//! (already room/user-filled) subjects, but the broker capability is there if a
//! future consumer wants wildcard fan-in.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_nats::Client;
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use super::{EventBus, Subscription};
use crate::error::BusError;
use crate::events::ChatEvent;

const SUBSCRIBER_QUEUE_DEPTH: usize = 1024;

pub struct NatsBus {
    client: Client,
    tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl NatsBus {
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::Subscribe(e.to_string()))?;
        Ok(Self {
            client,
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl EventBus for NatsBus {
    async fn publish(&self, topic: &str, event: ChatEvent) -> Result<(), BusError> {
        let bytes = serde_json::to_vec(&event).map_err(|e| BusError::Publish(e.to_string()))?;
        self.client
            .publish(topic.to_string(), bytes.into())
            .await
            .map_err(|e| BusError::Publish(e.to_string()))
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        let mut nats_sub = self
            .client
            .subscribe(topic.to_string())
            .await
            .map_err(|e| BusError::Subscribe(e.to_string()))?;

        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let handle = tokio::spawn(async move {
            while let Some(msg) = nats_sub.next().await {
                match serde_json::from_slice::<ChatEvent>(&msg.payload) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        eprintln!("nats bus: dropping undecodable message on {}: {e}", msg.subject);
                    }
                }
            }
        });

        self.tasks.lock().await.insert(id, handle);
        Ok(Subscription { id, receiver: rx })
    }

    async fn unsubscribe(&self, subscription_id: u64) -> Result<(), BusError> {
        if let Some(handle) = self.tasks.lock().await.remove(&subscription_id) {
            handle.abort();
        }
        Ok(())
    }

    async fn drain(&self) -> Result<(), BusError> {
        let mut tasks = self.tasks.lock().await;
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
        self.client
            .drain()
            .await
            .map_err(|e| BusError::Publish(e.to_string()))
    }
}
