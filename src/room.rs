//! Room registry for one room id (C2). Tracks attached sessions and the
//! subscriptions that exist purely to deliver history back-fill to a joining
//! session. Room-wide dispatch (chat/broadcast/presence/etc.) is driven centrally
//! by the handler registry (see `handlers::mod`), not by the room itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::bus::EventBus;
use crate::config::Config;
use crate::events::ChatEvent;
use crate::session::SessionHandle;
use crate::topics::TopicFormatter;

const HISTORY_BATCH_SIZE: usize = 10;
const HISTORY_BATCH_PAUSE: Duration = Duration::from_millis(50);
const HISTORY_RETRY_PAUSE: Duration = Duration::from_millis(100);

struct HistorySubscription {
    subscription_id: u64,
    forwarder: JoinHandle<()>,
}

pub struct Room {
    pub room_id: String,
    clients: Mutex<HashMap<String, SessionHandle>>,
    history_subs: Mutex<HashMap<String, HistorySubscription>>,
    bus: Arc<dyn EventBus>,
    topics: TopicFormatter,
    config: Config,
}

impl Room {
    pub fn new(room_id: String, bus: Arc<dyn EventBus>, topics: TopicFormatter, config: Config) -> Self {
        Self {
            room_id,
            clients: Mutex::new(HashMap::new()),
            history_subs: Mutex::new(HashMap::new()),
            bus,
            topics,
            config,
        }
    }

    pub async fn add_client(&self, handle: SessionHandle) {
        // Subscribe to this user's history-response topic BEFORE publishing the
        // history request, so no delivery can race ahead of the subscription.
        let topic = self.topics.history_response(&self.room_id, &handle.user_id);
        let subscription = match self.bus.subscribe(&topic).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("room {}: failed to subscribe history-response for {}: {e}", self.room_id, handle.user_id);
                return;
            }
        };
        let subscription_id = subscription.id;
        let forward_handle = handle.clone();
        let forwarder = tokio::spawn(forward_history_responses(subscription, forward_handle));

        {
            let mut subs = self.history_subs.lock().await;
            subs.insert(
                handle.user_id.clone(),
                HistorySubscription { subscription_id, forwarder },
            );
        }
        {
            let mut clients = self.clients.lock().await;
            clients.insert(handle.user_id.clone(), handle.clone());
        }

        let now = Utc::now();
        let _ = self
            .bus
            .publish(
                &self.topics.connection_event(&self.room_id),
                ChatEvent::ConnectionConnect {
                    room_id: self.room_id.clone(),
                    user_id: handle.user_id.clone(),
                    username: handle.username.clone(),
                    timestamp: now,
                },
            )
            .await;

        // The source system publishes `user.joined` from a separate HTTP
        // room-membership endpoint (out of scope here); a session registering
        // with the room is this core's equivalent join boundary.
        let _ = self
            .bus
            .publish(
                &self.topics.user_joined(&self.room_id),
                ChatEvent::UserJoined {
                    room_id: self.room_id.clone(),
                    user_id: handle.user_id.clone(),
                    username: handle.username.clone(),
                    timestamp: now,
                },
            )
            .await;

        let _ = self
            .bus
            .publish(
                &self.topics.history_request(&self.room_id),
                ChatEvent::HistoryRequest {
                    room_id: self.room_id.clone(),
                    user_id: handle.user_id.clone(),
                    limit: self.config.history_page_size,
                    timestamp: now,
                },
            )
            .await;
    }

    pub async fn remove_client(&self, user_id: &str) {
        let removed = {
            let mut clients = self.clients.lock().await;
            clients.remove(user_id)
        };
        let Some(handle) = removed else { return };

        if let Some(sub) = self.history_subs.lock().await.remove(user_id) {
            sub.forwarder.abort();
            let _ = self.bus.unsubscribe(sub.subscription_id).await;
        }

        let now = Utc::now();
        let _ = self
            .bus
            .publish(
                &self.topics.connection_event(&self.room_id),
                ChatEvent::ConnectionDisconnect {
                    room_id: self.room_id.clone(),
                    user_id: handle.user_id.clone(),
                    username: handle.username.clone(),
                    timestamp: now,
                },
            )
            .await;

        let _ = self
            .bus
            .publish(
                &self.topics.user_left(&self.room_id),
                ChatEvent::UserLeft {
                    room_id: self.room_id.clone(),
                    user_id: handle.user_id.clone(),
                    username: handle.username.clone(),
                    timestamp: now,
                },
            )
            .await;
    }

    /// Non-blocking fan-out to every attached session. Any session whose queue is
    /// full is dropped — the sole backpressure mechanism (no session may stall the
    /// others).
    pub async fn broadcast(&self, frame: crate::models::OutboundFrame) {
        let handles: Vec<SessionHandle> = self.clients.lock().await.values().cloned().collect();
        let mut dropped = Vec::new();
        for handle in handles {
            if handle.try_send(frame.clone()).is_err() {
                dropped.push(handle.user_id.clone());
            }
        }
        for user_id in dropped {
            self.remove_client(&user_id).await;
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn find_client(&self, user_id: &str) -> Option<SessionHandle> {
        self.clients.lock().await.get(user_id).cloned()
    }

    /// All attached user ids, snapshotted under the lock. Used by shutdown to
    /// drop every client without holding the lock across the per-client teardown.
    pub async fn client_ids(&self) -> Vec<String> {
        self.clients.lock().await.keys().cloned().collect()
    }
}

/// Batch-of-10, 50ms inter-batch pause, single retry after 100ms on a full queue,
/// abort on second failure. Grounded verbatim on the source system's
/// `HistoryResponseHandler.Handle`.
async fn forward_history_responses(mut subscription: crate::bus::Subscription, handle: SessionHandle) {
    while let Some(event) = subscription.receiver.recv().await {
        let ChatEvent::HistoryResponse { messages, .. } = event else { continue };

        for batch in messages.chunks(HISTORY_BATCH_SIZE) {
            for message in batch {
                let frame = crate::models::OutboundFrame::from(message.clone());
                if handle.try_send(frame.clone()).is_err() {
                    tokio::time::sleep(HISTORY_RETRY_PAUSE).await;
                    if handle.try_send(frame).is_err() {
                        eprintln!(
                            "room: dropping history message {} for {} after retry failed",
                            message.id, handle.user_id
                        );
                        return;
                    }
                }
            }
            tokio::time::sleep(HISTORY_BATCH_PAUSE).await;
        }
    }
}
