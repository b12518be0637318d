//! Room registry (C3). Creates rooms lazily on first use and hands each new
//! room its own dispatcher. Grounded on `original_source/internal/chat/hub.go`'s
//! register/unregister bookkeeping, deliberately not reproducing that file's
//! delete-when-empty branch: rooms here are never torn down once created.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::ai::Manager as AiManager;
use crate::bus::EventBus;
use crate::config::Config;
use crate::handlers::{HandlerRegistry, spawn_room_dispatcher};
use crate::room::Room;
use crate::store::Store;
use crate::topics::TopicFormatter;

pub struct Hub {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn Store>,
    bus: Arc<dyn EventBus>,
    topics: TopicFormatter,
    config: Config,
    ai: Arc<AiManager>,
}

impl Hub {
    pub fn new(store: Arc<dyn Store>, bus: Arc<dyn EventBus>, topics: TopicFormatter, config: Config, ai: Arc<AiManager>) -> Self {
        Self { rooms: Mutex::new(HashMap::new()), registry: Arc::new(HandlerRegistry::with_defaults()), store, bus, topics, config, ai }
    }

    /// Returns the room for `room_id`, creating it (and spawning its dispatcher)
    /// on first reference. Rooms are never removed; an empty room simply has no
    /// attached sessions until the next one joins.
    pub async fn get_or_create_room(&self, room_id: &str) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(room_id) {
            return room.clone();
        }

        let room = Arc::new(Room::new(room_id.to_string(), self.bus.clone(), self.topics.clone(), self.config.clone()));
        spawn_room_dispatcher(
            self.registry.clone(),
            room.clone(),
            self.store.clone(),
            self.bus.clone(),
            self.topics.clone(),
            self.config.clone(),
            self.ai.clone(),
        );
        rooms.insert(room_id.to_string(), room.clone());
        room
    }

    pub async fn find_room(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Sum of attached sessions across every room, for the `/stats` surface.
    pub async fn session_count(&self) -> usize {
        let rooms: Vec<Arc<Room>> = self.rooms.lock().await.values().cloned().collect();
        let mut total = 0;
        for room in rooms {
            total += room.client_count().await;
        }
        total
    }

    /// Lookup used by handlers that must deliver to one specific user, e.g.
    /// history-response. A miss (room or user unknown) is a normal, silent
    /// "client already disconnected" case, not an error.
    pub async fn find_client(&self, room_id: &str, user_id: &str) -> Option<crate::session::SessionHandle> {
        let room = self.find_room(room_id).await?;
        room.find_client(user_id).await
    }

    /// Shutdown drain: closes every session's outbound queue exactly once across
    /// every room, clears the room registry, then releases the bus. This is
    /// terminal process teardown, not the runtime room-GC policy `get_or_create_room`
    /// deliberately omits — nothing queries the hub again after this returns.
    pub async fn close(&self) {
        let rooms: Vec<Arc<Room>> = self.rooms.lock().await.values().cloned().collect();
        for room in rooms {
            for user_id in room.client_ids().await {
                room.remove_client(&user_id).await;
            }
        }
        self.rooms.lock().await.clear();
        if let Err(e) = self.bus.drain().await {
            eprintln!("hub: bus drain failed during shutdown: {e}");
        }
    }
}
