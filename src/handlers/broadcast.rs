//! `message.broadcast` handler: fan out to every session in the room, dropping
//! any session whose queue is full. Grounded on `BroadcastHandler`.

use crate::events::ChatEvent;
use crate::models::OutboundFrame;

use super::HandlerContext;

pub async fn handle(ctx: HandlerContext, event: ChatEvent) {
    let ChatEvent::MessageBroadcast { message } = event else { return };
    ctx.room.broadcast(OutboundFrame::from(message)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Manager as AiManager;
    use crate::ai::provider::MockProvider;
    use crate::bus::EventBus;
    use crate::bus::local::LocalBus;
    use crate::config::Config;
    use crate::models::ChatMessage;
    use crate::room::Room;
    use crate::session::SessionHandle;
    use crate::store::{SqliteStore, Store};
    use crate::topics::TopicFormatter;
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test]
    async fn fans_out_to_every_attached_session() {
        let bus: Arc<dyn EventBus> = Arc::new(LocalBus::new());
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let topics = TopicFormatter::new("settlechat");
        let room = Arc::new(Room::new("r1".to_string(), bus.clone(), topics.clone(), Config::default()));
        let ai = Arc::new(AiManager::new(store.clone(), bus.clone(), topics.clone(), Config::default(), Arc::new(MockProvider::default())));

        let (a, mut a_rx) = SessionHandle::for_test("a", "r1", 4);
        let (b, mut b_rx) = SessionHandle::for_test("b", "r1", 4);
        room.add_client(a).await;
        room.add_client(b).await;

        let ctx = HandlerContext { room, store, bus, topics, config: Config::default(), ai };
        let message = ChatMessage {
            id: 1,
            room_id: "r1".to_string(),
            sender_id: "alice".to_string(),
            sender: "alice".to_string(),
            content: "hi".to_string(),
            timestamp: Utc::now(),
        };
        handle(ctx, ChatEvent::MessageBroadcast { message }).await;

        assert_eq!(a_rx.recv().await.unwrap().content, "hi");
        assert_eq!(b_rx.recv().await.unwrap().content, "hi");
    }
}
