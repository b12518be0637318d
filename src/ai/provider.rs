//! AI backends pluggable behind one [`Provider`] trait: a deterministic
//! [`MockProvider`] for tests, and [`LmStudioProvider`] talking to a local
//! OpenAI-compatible completion endpoint. Grounded on
//! `original_source/internal/ai/provider.go`, `mock_provider.go` and
//! `LMStudioProvider.go`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::ProviderError;

/// One message handed to a provider, analogous to an OpenAI chat message.
#[derive(Debug, Clone)]
pub struct MessageInput {
    pub role: String,
    pub content: String,
    pub name: String,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> String;

    /// Summarizes `messages`, continuing from `previous_summary` when non-empty.
    async fn generate_summary(&self, messages: &[MessageInput], previous_summary: &str) -> Result<String, ProviderError>;

    /// Answers a free-form `/prompt` instruction given the triggering messages.
    async fn process_prompt(&self, prompt: &str, messages: &[MessageInput]) -> Result<String, ProviderError>;
}

/// Deterministic stand-in used in tests and local development, matching
/// `mock_provider.go`'s shape (a name and a simulated response delay).
pub struct MockProvider {
    name: String,
    response_delay: Duration,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), response_delay: Duration::from_millis(100) }
    }

    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn generate_summary(&self, messages: &[MessageInput], previous_summary: &str) -> Result<String, ProviderError> {
        tokio::time::sleep(self.response_delay).await;

        if messages.is_empty() {
            return Err(ProviderError::BadResponse("no messages to summarize".to_string()));
        }

        let mut summary = String::from("Summary:\n\n");
        if !previous_summary.is_empty() {
            summary.push_str("Previous summary:\n");
            summary.push_str(previous_summary);
            summary.push_str("\n\n");
        }
        summary.push_str("New messages:\n");
        for message in messages {
            summary.push_str(&format!("- {}: {}\n", message.name, message.content));
        }
        summary.push_str(&format!("\nMock summary covering {} messages.", messages.len()));
        Ok(summary)
    }

    async fn process_prompt(&self, prompt: &str, messages: &[MessageInput]) -> Result<String, ProviderError> {
        tokio::time::sleep(self.response_delay).await;

        if messages.is_empty() {
            return Err(ProviderError::BadResponse("no messages to process".to_string()));
        }

        let mut response = format!("Mock response to prompt \"{prompt}\":\n\n");
        for message in messages {
            response.push_str(&format!("- {}: {}\n", message.name, message.content));
        }
        Ok(response)
    }
}

const LM_STUDIO_URL: &str = "http://localhost:1234/v1/chat/completions";
const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528-qwen3-8b";

/// Talks to a local LM Studio (or any OpenAI-compatible) server.
pub struct LmStudioProvider {
    model: String,
    client: reqwest::Client,
}

impl LmStudioProvider {
    pub fn new() -> Self {
        Self::with_model(DEFAULT_MODEL)
    }

    pub fn with_model(model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builds with a fixed, valid config");
        Self { model: model.into(), client }
    }

    async fn call(&self, system_prompt: &str, messages: &[MessageInput], max_tokens: u32, temperature: f64) -> Result<String, ProviderError> {
        let mut chat_messages = vec![json!({"role": "system", "content": system_prompt})];
        for message in messages {
            chat_messages.push(json!({
                "role": message.role,
                "content": format!("{}: {}", message.name, message.content),
            }));
        }

        let body = json!({
            "model": self.model,
            "messages": chat_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": false,
        });

        let response = self
            .client
            .post(LM_STUDIO_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::BadResponse(format!("LM Studio returned {status}: {text}")));
        }

        let parsed: Value = response.json().await.map_err(|e| ProviderError::Transport(e.to_string()))?;

        let content = parsed
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::BadResponse("missing choices[0].message.content".to_string()))?;

        Ok(strip_reasoning(content))
    }
}

impl Default for LmStudioProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// LM Studio reasoning models prefix their answer with a `<think>...</think>`
/// block; only the text after it is the actual answer.
fn strip_reasoning(content: &str) -> String {
    match content.split_once("</think>") {
        Some((_, rest)) => rest.trim().to_string(),
        None => content.trim().to_string(),
    }
}

#[async_trait]
impl Provider for LmStudioProvider {
    fn name(&self) -> String {
        format!("LM({})", self.model)
    }

    async fn generate_summary(&self, messages: &[MessageInput], previous_summary: &str) -> Result<String, ProviderError> {
        let mut system_prompt =
            "You are a chat room assistant. Summarize the conversation with a light, humorous tone, \
             calling out the highlights."
                .to_string();
        if !previous_summary.is_empty() {
            system_prompt.push_str("\n\nHere is the previous summary; continue from it:\n");
            system_prompt.push_str(previous_summary);
        }
        self.call(&system_prompt, messages, 500, 0.7).await
    }

    async fn process_prompt(&self, prompt: &str, messages: &[MessageInput]) -> Result<String, ProviderError> {
        let system_prompt = format!("You are a chat room assistant. Follow this instruction from a room member:\n\n{prompt}");
        let (max_tokens, temperature) = if prompt.len() > 200 { (600, 0.6) } else { (400, 0.7) };
        self.call(&system_prompt, messages, max_tokens, temperature).await
    }
}
