//! `message.new` handler: persist, then republish for broadcast, and additionally
//! route slash-prefixed content to the AI command router. Grounded on
//! `ChatMessageHandler` in the source system's event handlers.

use tokio::time::timeout;

use crate::events::ChatEvent;
use crate::models::ChatMessage;

use super::HandlerContext;

pub async fn handle(ctx: HandlerContext, event: ChatEvent) {
    let ChatEvent::MessageNew { message } = event else { return };

    let saved = match timeout(ctx.config.store_deadline, ctx.store.save_message(message)).await {
        Ok(Ok(saved)) => saved,
        Ok(Err(e)) => {
            eprintln!("chat handler: failed to persist message in room {}: {e}", ctx.room.room_id);
            return;
        }
        Err(_) => {
            eprintln!("chat handler: store deadline exceeded for room {}", ctx.room.room_id);
            return;
        }
    };

    let is_command = saved.content.starts_with('/');

    let broadcast_topic = ctx.topics.message_broadcast(&ctx.room.room_id);
    if let Err(e) = ctx
        .bus
        .publish(&broadcast_topic, ChatEvent::MessageBroadcast { message: saved.clone() })
        .await
    {
        eprintln!("chat handler: failed to publish broadcast for room {}: {e}", ctx.room.room_id);
    }

    if is_command {
        let ai_topic = ctx.topics.ai_command(&ctx.room.room_id);
        if let Err(e) = ctx.bus.publish(&ai_topic, ChatEvent::AiCommand { message: saved }).await {
            eprintln!("chat handler: failed to publish ai command for room {}: {e}", ctx.room.room_id);
        }
    }
}
