//! Handler registry and per-room dispatch (C7). Handlers register under a
//! `(category, action)` key, mirroring the source system's `HandlerManager`. A
//! dispatcher task is spawned once per room, subscribing the fixed set of
//! room-scoped topics and routing each inbound event to its registered handler.

pub mod ai_command;
pub mod broadcast;
pub mod chat;
pub mod connection;
pub mod history;
pub mod presence;
pub mod system;
pub mod user;

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::ai::Manager as AiManager;
use crate::bus::EventBus;
use crate::config::Config;
use crate::events::ChatEvent;
use crate::room::Room;
use crate::store::Store;
use crate::topics::TopicFormatter;

/// Shared dependencies every handler needs. Cheap to clone (all `Arc` internally
/// except `Config`/`TopicFormatter`, which are themselves small and `Clone`).
#[derive(Clone)]
pub struct HandlerContext {
    pub room: Arc<Room>,
    pub store: Arc<dyn Store>,
    pub bus: Arc<dyn EventBus>,
    pub topics: TopicFormatter,
    pub config: Config,
    pub ai: Arc<AiManager>,
}

type HandlerFn = Arc<dyn Fn(HandlerContext, ChatEvent) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, category: &str, action: &str, handler: F)
    where
        F: Fn(HandlerContext, ChatEvent) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let key = format!("{category}.{action}");
        self.handlers.insert(key, Arc::new(move |ctx, event| Box::pin(handler(ctx, event))));
    }

    /// The registry shipped with the core: one handler per domain event in C8.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("message", "new", chat::handle);
        registry.register("message", "broadcast", broadcast::handle);
        registry.register("message", "history.request", history::handle_request);
        registry.register("user", "joined", user::handle_joined);
        registry.register("user", "left", user::handle_left);
        registry.register("user", "presence", presence::handle);
        registry.register("connection", "event", connection::handle);
        registry.register("system", "message", system::handle);
        registry.register("ai", "command", ai_command::handle);
        registry
    }

    async fn dispatch(&self, ctx: HandlerContext, topic_key: &str, event: ChatEvent) {
        match self.handlers.get(topic_key) {
            Some(handler) => handler(ctx, event).await,
            None => eprintln!("handlers: no handler registered for {topic_key}, dropping event"),
        }
    }
}

/// The fixed set of room-scoped subjects a room subscribes to once, for its whole
/// lifetime. `message.history.response.*` is deliberately absent: that delivery is
/// owned per-session by `Room::add_client`, not by this central dispatch table.
fn room_scoped_topics(topics: &TopicFormatter, room_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("user.joined", topics.user_joined(room_id)),
        ("user.left", topics.user_left(room_id)),
        ("user.presence", topics.presence(room_id)),
        ("message.new", topics.message_new(room_id)),
        ("message.broadcast", topics.message_broadcast(room_id)),
        ("message.history.request", topics.history_request(room_id)),
        ("system.message", topics.system_message(room_id)),
        ("connection.event", topics.connection_event(room_id)),
        ("ai.command", topics.ai_command(room_id)),
    ]
}

/// Spawns the per-room dispatcher: one subscription per topic in
/// `room_scoped_topics`, each feeding into `HandlerRegistry::dispatch`.
pub fn spawn_room_dispatcher(
    registry: Arc<HandlerRegistry>,
    room: Arc<Room>,
    store: Arc<dyn Store>,
    bus: Arc<dyn EventBus>,
    topics: TopicFormatter,
    config: Config,
    ai: Arc<AiManager>,
) {
    let ctx = HandlerContext { room: room.clone(), store, bus: bus.clone(), topics: topics.clone(), config, ai };

    for (key, subject) in room_scoped_topics(&topics, &room.room_id) {
        let registry = registry.clone();
        let ctx = ctx.clone();
        let bus = bus.clone();
        tokio::spawn(async move {
            let mut subscription = match bus.subscribe(&subject).await {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("handlers: failed to subscribe {subject}: {e}");
                    return;
                }
            };
            while let Some(event) = subscription.receiver.recv().await {
                registry.dispatch(ctx.clone(), key, event).await;
            }
        });
    }
}
