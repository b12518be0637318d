//! Event envelopes published on the bus. Every variant carries a `type` discriminator
//! and a timestamp, matching the source system's `BaseEvent` + typed-event shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ChatMessage;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum ChatEvent {
    #[serde(rename = "connection.connect")]
    ConnectionConnect {
        room_id: String,
        user_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "connection.disconnect")]
    ConnectionDisconnect {
        room_id: String,
        user_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "user.joined")]
    UserJoined {
        room_id: String,
        user_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "user.left")]
    UserLeft {
        room_id: String,
        user_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "user.presence")]
    UserPresence {
        room_id: String,
        user_id: String,
        username: String,
        online: bool,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "message.new")]
    MessageNew { message: ChatMessage },
    #[serde(rename = "message.broadcast")]
    MessageBroadcast { message: ChatMessage },
    #[serde(rename = "message.history.request")]
    HistoryRequest {
        room_id: String,
        user_id: String,
        limit: i64,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "message.history.response")]
    HistoryResponse {
        room_id: String,
        user_id: String,
        messages: Vec<ChatMessage>,
    },
    #[serde(rename = "system.message")]
    SystemMessage {
        room_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "ai.command")]
    AiCommand { message: ChatMessage },
}

impl ChatEvent {
    pub fn room_id(&self) -> &str {
        match self {
            ChatEvent::ConnectionConnect { room_id, .. }
            | ChatEvent::ConnectionDisconnect { room_id, .. }
            | ChatEvent::UserJoined { room_id, .. }
            | ChatEvent::UserLeft { room_id, .. }
            | ChatEvent::UserPresence { room_id, .. }
            | ChatEvent::HistoryRequest { room_id, .. }
            | ChatEvent::HistoryResponse { room_id, .. }
            | ChatEvent::SystemMessage { room_id, .. } => room_id,
            ChatEvent::MessageNew { message } | ChatEvent::MessageBroadcast { message } | ChatEvent::AiCommand { message } => {
                &message.room_id
            }
        }
    }

    /// Mirrors `getTopicForEvent`: decide which concrete subject an event belongs on.
    pub fn topic(&self, topics: &crate::topics::TopicFormatter) -> String {
        match self {
            ChatEvent::ConnectionConnect { room_id, .. } | ChatEvent::ConnectionDisconnect { room_id, .. } => {
                topics.connection_event(room_id)
            }
            ChatEvent::UserJoined { room_id, .. } => topics.user_joined(room_id),
            ChatEvent::UserLeft { room_id, .. } => topics.user_left(room_id),
            ChatEvent::UserPresence { room_id, .. } => topics.presence(room_id),
            ChatEvent::MessageNew { message } => topics.message_new(&message.room_id),
            ChatEvent::MessageBroadcast { message } => topics.message_broadcast(&message.room_id),
            ChatEvent::HistoryRequest { room_id, .. } => topics.history_request(room_id),
            ChatEvent::HistoryResponse { room_id, user_id, .. } => topics.history_response(room_id, user_id),
            ChatEvent::SystemMessage { room_id, .. } => topics.system_message(room_id),
            ChatEvent::AiCommand { message } => topics.ai_command(&message.room_id),
        }
    }
}
