//! `system.message` handler: rewrap as a sender="system" chat message and
//! republish for broadcast, so system announcements flow through the same
//! delivery path as user chat.

use crate::events::ChatEvent;
use crate::models::{ChatMessage, SYSTEM_SENDER_ID};

use super::HandlerContext;

pub async fn handle(ctx: HandlerContext, event: ChatEvent) {
    let ChatEvent::SystemMessage { room_id, message, timestamp } = event else { return };

    let chat_message = ChatMessage {
        id: 0,
        room_id: room_id.clone(),
        sender_id: SYSTEM_SENDER_ID.to_string(),
        sender: SYSTEM_SENDER_ID.to_string(),
        content: message,
        timestamp,
    };

    let topic = ctx.topics.message_broadcast(&room_id);
    if let Err(e) = ctx.bus.publish(&topic, ChatEvent::MessageBroadcast { message: chat_message }).await {
        eprintln!("system handler: failed to publish broadcast for room {room_id}: {e}");
    }
}
