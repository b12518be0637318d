//! `connection.event` handler: connect/disconnect are mostly informational at
//! this layer (the room itself already reacted to them); the one durable effect
//! is bumping the user's last-active timestamp.

use tokio::time::timeout;

use crate::events::ChatEvent;

use super::HandlerContext;

pub async fn handle(ctx: HandlerContext, event: ChatEvent) {
    let user_id = match &event {
        ChatEvent::ConnectionConnect { user_id, .. } | ChatEvent::ConnectionDisconnect { user_id, .. } => user_id.clone(),
        _ => return,
    };

    if let Err(e) = timeout(ctx.config.store_deadline, ctx.store.update_last_active(&user_id)).await {
        eprintln!("connection handler: store deadline updating last_active for {user_id}: {e}");
    }
}
