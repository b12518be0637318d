//! `message.history.request` handler: fetch recent messages and publish them on
//! the requesting user's history-response topic. Grounded on `HistoryHandler`.

use tokio::time::timeout;

use crate::events::ChatEvent;

use super::HandlerContext;

pub async fn handle_request(ctx: HandlerContext, event: ChatEvent) {
    let ChatEvent::HistoryRequest { room_id, user_id, limit, .. } = event else { return };

    let messages = match timeout(ctx.config.store_deadline, ctx.store.get_recent_messages(&room_id, limit)).await {
        Ok(Ok(messages)) => messages,
        Ok(Err(e)) => {
            eprintln!("history handler: store error for room {room_id}: {e}");
            return;
        }
        Err(_) => {
            eprintln!("history handler: store deadline exceeded for room {room_id}");
            return;
        }
    };

    let topic = ctx.topics.history_response(&room_id, &user_id);
    if let Err(e) = ctx
        .bus
        .publish(&topic, ChatEvent::HistoryResponse { room_id, user_id, messages })
        .await
    {
        eprintln!("history handler: failed to publish response: {e}");
    }
}
