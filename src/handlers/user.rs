//! `user.joined` / `user.left` handlers: persist membership, announce via a system
//! message, and flip presence. Grounded on the `HandlerManager`'s user-event
//! siblings to `ChatMessageHandler`.

use tokio::time::timeout;

use crate::events::ChatEvent;

use super::HandlerContext;

pub async fn handle_joined(ctx: HandlerContext, event: ChatEvent) {
    let ChatEvent::UserJoined { room_id, user_id, username, timestamp } = event else { return };

    if let Err(e) = timeout(ctx.config.store_deadline, ctx.store.add_user_to_room(&user_id, &username, &room_id)).await {
        eprintln!("user handler: store deadline adding {user_id} to {room_id}: {e}");
    }

    announce(&ctx, &room_id, format!("{username} joined the room"), timestamp).await;
    set_presence(&ctx, &room_id, &user_id, &username, true, timestamp).await;
}

pub async fn handle_left(ctx: HandlerContext, event: ChatEvent) {
    let ChatEvent::UserLeft { room_id, user_id, username, timestamp } = event else { return };

    announce(&ctx, &room_id, format!("{username} left the room"), timestamp).await;
    set_presence(&ctx, &room_id, &user_id, &username, false, timestamp).await;
}

async fn announce(ctx: &HandlerContext, room_id: &str, message: String, timestamp: chrono::DateTime<chrono::Utc>) {
    let topic = ctx.topics.system_message(room_id);
    if let Err(e) = ctx
        .bus
        .publish(&topic, ChatEvent::SystemMessage { room_id: room_id.to_string(), message, timestamp })
        .await
    {
        eprintln!("user handler: failed to publish system message: {e}");
    }
}

async fn set_presence(
    ctx: &HandlerContext,
    room_id: &str,
    user_id: &str,
    username: &str,
    online: bool,
    timestamp: chrono::DateTime<chrono::Utc>,
) {
    let topic = ctx.topics.presence(room_id);
    if let Err(e) = ctx
        .bus
        .publish(
            &topic,
            ChatEvent::UserPresence {
                room_id: room_id.to_string(),
                user_id: user_id.to_string(),
                username: username.to_string(),
                online,
                timestamp,
            },
        )
        .await
    {
        eprintln!("user handler: failed to publish presence: {e}");
    }
}
