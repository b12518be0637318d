//! `user.presence` handler: persist the online flag and bump the user's
//! last-active timestamp.

use tokio::time::timeout;

use crate::events::ChatEvent;

use super::HandlerContext;

pub async fn handle(ctx: HandlerContext, event: ChatEvent) {
    let ChatEvent::UserPresence { room_id, user_id, online, .. } = event else { return };

    match timeout(ctx.config.store_deadline, ctx.store.update_presence(&room_id, &user_id, online)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => eprintln!("presence handler: failed to update presence for {user_id} in {room_id}: {e}"),
        Err(_) => eprintln!("presence handler: store deadline updating presence for {user_id} in {room_id}"),
    }
    if let Err(e) = timeout(ctx.config.store_deadline, ctx.store.update_last_active(&user_id)).await {
        eprintln!("presence handler: store deadline updating last_active for {user_id}: {e}");
    }
}
