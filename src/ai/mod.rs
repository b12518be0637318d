//! AI command router (C9): one lazily-created [`Agent`] per room, evicted
//! after an idle timeout by a periodic sweep. Grounded on
//! `original_source/internal/ai/manager.go` and `agent.go`, with the sweep's
//! shape borrowed from the teacher's `spawn_retention_task`.

pub mod command;
pub mod provider;
pub mod summary;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::bus::EventBus;
use crate::config::Config;
use crate::events::ChatEvent;
use crate::models::{AI_SENDER_ID, ChatMessage};
use crate::store::Store;
use crate::topics::TopicFormatter;

use command::{
    COMMAND_CLEAR, COMMAND_HELP, COMMAND_PROMPT, COMMAND_STATS, COMMAND_SUMMARY, empty_prompt_text, help_text, parse_command,
    unsupported_command_text,
};
use provider::Provider;
use summary::{SummaryCache, handle_summary, preprocess_messages_for_ai};

/// Per-room AI state: summary cache and recency, for idle eviction.
struct Agent {
    summary_cache: Mutex<SummaryCache>,
    last_used: std::sync::Mutex<Instant>,
}

impl Agent {
    fn new() -> Self {
        Self { summary_cache: Mutex::new(SummaryCache::new()), last_used: std::sync::Mutex::new(Instant::now()) }
    }

    fn touch(&self) {
        *self.last_used.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self) -> std::time::Duration {
        self.last_used.lock().unwrap_or_else(|e| e.into_inner()).elapsed()
    }
}

type AgentMap = Arc<Mutex<HashMap<String, Arc<Agent>>>>;

/// Facade over the per-room agents. Owns the store and provider so a command
/// handler only ever has to go through `Manager::handle`.
pub struct Manager {
    store: Arc<dyn Store>,
    bus: Arc<dyn EventBus>,
    topics: TopicFormatter,
    provider: Arc<dyn Provider>,
    config: Config,
    agents: AgentMap,
}

impl Manager {
    pub fn new(store: Arc<dyn Store>, bus: Arc<dyn EventBus>, topics: TopicFormatter, config: Config, provider: Arc<dyn Provider>) -> Self {
        let agents: AgentMap = Arc::new(Mutex::new(HashMap::new()));
        spawn_idle_sweep(agents.clone(), config.agent_cleanup_interval, config.agent_idle_timeout);
        Self { store, bus, topics, provider, config, agents }
    }

    async fn get_or_create_agent(&self, room_id: &str) -> Arc<Agent> {
        let mut agents = self.agents.lock().await;
        if let Some(agent) = agents.get(room_id) {
            agent.touch();
            return agent.clone();
        }
        let agent = Arc::new(Agent::new());
        agents.insert(room_id.to_string(), agent.clone());
        agent
    }

    /// Handles one `/`-prefixed chat message: parses the command, runs it
    /// against the room's agent, and publishes the agent's reply as a chat
    /// message on the room's broadcast topic.
    pub async fn handle(&self, message: &ChatMessage) {
        let (command, args) = parse_command(&message.content);
        if command.is_empty() {
            return;
        }

        let agent = self.get_or_create_agent(&message.room_id).await;
        let reply = self.run_command(&agent, &command, &args, message).await;

        let response = ChatMessage {
            id: 0,
            room_id: message.room_id.clone(),
            sender_id: AI_SENDER_ID.to_string(),
            sender: AI_SENDER_ID.to_string(),
            content: reply,
            timestamp: Utc::now(),
        };

        let topic = self.topics.message_broadcast(&response.room_id);
        if let Err(e) = self.bus.publish(&topic, ChatEvent::MessageBroadcast { message: response }).await {
            eprintln!("ai manager: failed to publish response for room {}: {e}", message.room_id);
        }
    }

    async fn run_command(&self, agent: &Agent, command: &str, args: &[String], message: &ChatMessage) -> String {
        match command {
            COMMAND_HELP => help_text(),
            COMMAND_SUMMARY => {
                let mut cache = agent.summary_cache.lock().await;
                let call = handle_summary(&mut cache, self.store.as_ref(), self.provider.as_ref(), &message.room_id);
                match timeout(self.config.provider_deadline, call).await {
                    Ok(Ok(summary)) => summary,
                    Ok(Err(e)) => format!("Couldn't generate a summary right now ({e}); try again later"),
                    Err(_) => "Couldn't generate a summary right now (provider deadline exceeded); try again later".to_string(),
                }
            }
            COMMAND_STATS => {
                let cache = agent.summary_cache.lock().await;
                let stats = cache.stats();
                format!(
                    "AI assistant stats for room {}:\n\
                     last summary: {:?}\n\
                     has previous summary: {}\n\
                     summarized messages: {}\n\
                     summary length: {} chars",
                    message.room_id, stats.last_summary_time, stats.has_previous_summary, stats.summarized_message_count, stats.summary_text_length
                )
            }
            COMMAND_CLEAR => {
                agent.summary_cache.lock().await.clear();
                "Summary history cleared; the next /summary starts fresh".to_string()
            }
            COMMAND_PROMPT => {
                if args.is_empty() {
                    empty_prompt_text()
                } else {
                    let prompt = args.join(" ");
                    let inputs = preprocess_messages_for_ai(std::slice::from_ref(message));
                    match timeout(self.config.provider_deadline, self.provider.process_prompt(&prompt, &inputs)).await {
                        Ok(Ok(answer)) => answer,
                        Ok(Err(e)) => format!("Couldn't process that prompt ({e})"),
                        Err(_) => "Couldn't process that prompt (provider deadline exceeded)".to_string(),
                    }
                }
            }
            _ => unsupported_command_text(),
        }
    }
}

/// Background sweep evicting agents idle for longer than `idle_timeout`,
/// shaped after the teacher's `spawn_retention_task` periodic loop.
fn spawn_idle_sweep(agents: AgentMap, cleanup_interval: std::time::Duration, idle_timeout: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cleanup_interval);
        loop {
            ticker.tick().await;
            let mut agents = agents.lock().await;
            agents.retain(|_, agent| agent.idle_for() < idle_timeout);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::local::LocalBus;
    use crate::store::SqliteStore;
    use provider::MockProvider;
    use std::time::Duration;

    fn manager() -> Arc<Manager> {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let bus: Arc<dyn EventBus> = Arc::new(LocalBus::new());
        let topics = TopicFormatter::new("settlechat");
        let provider: Arc<dyn Provider> = Arc::new(MockProvider::default().with_response_delay(Duration::from_millis(0)));
        Arc::new(Manager::new(store, bus, topics, Config::default(), provider))
    }

    fn command_message(room_id: &str, content: &str) -> ChatMessage {
        ChatMessage {
            id: 1,
            room_id: room_id.to_string(),
            sender_id: "u1".to_string(),
            sender: "alice".to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn help_command_publishes_help_text_as_ai_sender() {
        let manager = manager();
        let mut sub = manager.bus.subscribe("settlechat.message.broadcast.r1").await.unwrap();

        manager.handle(&command_message("r1", "/help")).await;

        match sub.receiver.recv().await.unwrap() {
            ChatEvent::MessageBroadcast { message } => {
                assert_eq!(message.sender_id, "ai");
                assert!(message.content.contains("/summary"));
            }
            _ => panic!("wrong event"),
        }
    }

    #[tokio::test]
    async fn non_command_content_is_ignored() {
        let manager = manager();
        manager.handle(&command_message("r1", "just chatting")).await;
        assert!(manager.agents.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_command_gets_the_generic_response() {
        let manager = manager();
        let mut sub = manager.bus.subscribe("settlechat.message.broadcast.r1").await.unwrap();

        manager.handle(&command_message("r1", "/nope")).await;

        match sub.receiver.recv().await.unwrap() {
            ChatEvent::MessageBroadcast { message } => assert_eq!(message.content, "Unsupported command"),
            _ => panic!("wrong event"),
        }
    }

    #[tokio::test]
    async fn prompt_without_args_asks_for_text() {
        let manager = manager();
        let mut sub = manager.bus.subscribe("settlechat.message.broadcast.r1").await.unwrap();

        manager.handle(&command_message("r1", "/prompt")).await;

        match sub.receiver.recv().await.unwrap() {
            ChatEvent::MessageBroadcast { message } => assert!(message.content.contains("provide")),
            _ => panic!("wrong event"),
        }
    }

    #[tokio::test]
    async fn repeated_commands_reuse_the_same_agent() {
        let manager = manager();
        manager.handle(&command_message("r1", "/help")).await;
        manager.handle(&command_message("r1", "/stats")).await;
        assert_eq!(manager.agents.lock().await.len(), 1);
    }
}
