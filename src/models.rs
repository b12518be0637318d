use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted chat message. Field set mirrors `storage.ChatMessage` in the source
/// system: id, room, sender identity, content, timestamp.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub room_id: String,
    pub sender_id: String,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A known user, as far as the core is concerned (authentication lives elsewhere).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Per-(room, user) presence state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PresenceRecord {
    pub room_id: String,
    pub user_id: String,
    pub online: bool,
    pub last_seen: DateTime<Utc>,
}

/// Inbound frame decoded off the wire from a client session.
#[derive(Debug, Deserialize, Clone)]
pub struct InboundFrame {
    pub room_id: String,
    pub sender_id: String,
    pub sender: String,
    #[serde(default)]
    pub content: String,
}

impl InboundFrame {
    /// Empty content from an otherwise-valid frame is a heartbeat, not a chat message.
    pub fn is_heartbeat(&self) -> bool {
        is_heartbeat_content(&self.content)
    }
}

/// Shared by `InboundFrame::is_heartbeat` and the session read loop, which only
/// holds the decoded content by the time it has to make this call.
pub fn is_heartbeat_content(content: &str) -> bool {
    content.is_empty()
}

/// Outbound frame serialized to the wire. Same shape as `ChatMessage`, kept as a
/// distinct type so wire-format changes don't leak into the store's representation.
#[derive(Debug, Serialize, Clone)]
pub struct OutboundFrame {
    pub room_id: String,
    pub sender_id: String,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for OutboundFrame {
    fn from(m: ChatMessage) -> Self {
        OutboundFrame {
            room_id: m.room_id,
            sender_id: m.sender_id,
            sender: m.sender,
            content: m.content,
            timestamp: m.timestamp,
        }
    }
}

pub const SYSTEM_SENDER_ID: &str = "system";
pub const AI_SENDER_ID: &str = "ai";
