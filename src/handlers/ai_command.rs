//! `ai.command` handler: hands the triggering chat message to the AI manager,
//! which parses the command, runs it against the room's agent, and publishes
//! the reply itself. Grounded on `original_source/internal/ai/manager.go`'s
//! `HandleAIMessage`, consolidated so the AI manager owns its own response
//! publication instead of routing it back through this handler.

use crate::events::ChatEvent;

use super::HandlerContext;

pub async fn handle(ctx: HandlerContext, event: ChatEvent) {
    let ChatEvent::AiCommand { message } = event else { return };
    ctx.ai.handle(&message).await;
}
