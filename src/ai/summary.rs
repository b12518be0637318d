//! Per-room summary cache and the `/summary` algorithm. Grounded verbatim on
//! `original_source/internal/ai/summary.go`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::ai::provider::{MessageInput, Provider};
use crate::error::ProviderError;
use crate::models::{ChatMessage, SYSTEM_SENDER_ID};
use crate::store::Store;

const RECENT_MESSAGE_WINDOW: i64 = 100;
const SUMMARIZED_ID_CAP: usize = 1000;

/// Tracks what has already been folded into a room's running summary, so the
/// next `/summary` only has to cover what's new.
pub struct SummaryCache {
    last_summary_time: Option<DateTime<Utc>>,
    last_summary_text: String,
    summarized_ids: HashSet<i64>,
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self { last_summary_time: None, last_summary_text: String::new(), summarized_ids: HashSet::new() }
    }
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, messages: &[ChatMessage], summary: String) {
        self.last_summary_time = Some(Utc::now());
        self.last_summary_text = summary;

        for message in messages {
            self.summarized_ids.insert(message.id);
        }

        // Evict and reseed with just the current batch rather than a full
        // reset, matching `updateSummaryCache`'s `> 1000` branch.
        if self.summarized_ids.len() > SUMMARIZED_ID_CAP {
            self.summarized_ids = messages.iter().map(|m| m.id).collect();
        }
    }

    pub fn clear(&mut self) {
        self.last_summary_text.clear();
        self.summarized_ids.clear();
        self.last_summary_time = None;
    }

    pub fn stats(&self) -> SummaryStats {
        SummaryStats {
            last_summary_time: self.last_summary_time,
            has_previous_summary: !self.last_summary_text.is_empty(),
            summarized_message_count: self.summarized_ids.len(),
            summary_text_length: self.last_summary_text.chars().count(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryStats {
    pub last_summary_time: Option<DateTime<Utc>>,
    pub has_previous_summary: bool,
    pub summarized_message_count: usize,
    pub summary_text_length: usize,
}

/// Converts stored messages into the provider's chat-message shape, tagging
/// the system sender's lines with the `system` role.
pub fn preprocess_messages_for_ai(messages: &[ChatMessage]) -> Vec<MessageInput> {
    messages
        .iter()
        .map(|message| {
            let role = if message.sender == SYSTEM_SENDER_ID { "system" } else { "user" };
            MessageInput { role: role.to_string(), content: message.content.clone(), name: message.sender.clone() }
        })
        .collect()
}

/// Runs the `/summary` workflow for one room: fetch the new messages, ask the
/// provider for a summary continuing from the cached one, and record the
/// result. Returns a friendly "nothing to summarize" message rather than an
/// error when there is nothing new.
pub async fn handle_summary(
    cache: &mut SummaryCache,
    store: &dyn Store,
    provider: &dyn Provider,
    room_id: &str,
) -> Result<String, ProviderError> {
    let new_messages = new_messages_for_summary(cache, store, room_id).await?;
    if new_messages.is_empty() {
        return Ok("No new messages to summarize".to_string());
    }

    let previous_summary = cache.last_summary_text.clone();
    let inputs = preprocess_messages_for_ai(&new_messages);
    let summary = provider.generate_summary(&inputs, &previous_summary).await?;

    cache.record(&new_messages, summary.clone());
    Ok(summary)
}

async fn new_messages_for_summary(cache: &SummaryCache, store: &dyn Store, room_id: &str) -> Result<Vec<ChatMessage>, ProviderError> {
    let all_messages = store
        .get_recent_messages(room_id, RECENT_MESSAGE_WINDOW)
        .await
        .map_err(|e| ProviderError::BadResponse(format!("fetching recent messages failed: {e}")))?;

    let Some(last_summary_time) = cache.last_summary_time else {
        return Ok(all_messages);
    };

    Ok(all_messages
        .into_iter()
        .filter(|m| m.timestamp > last_summary_time && !cache.summarized_ids.contains(&m.id))
        .collect())
}
