use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Request};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{status_error, ChatBackend};
use crate::config::LlmConfig;
use crate::error::{AssistError, Result};

/// OpenAI-compatible `/chat/completions` backend.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            api_key: config.get_api_key()?,
            base_url: config.base_url(),
            model: config.model().to_string(),
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the first choice's message text out of a chat completion body.
pub fn extract_chat_content(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| AssistError::answer_unavailable("LLM response has no message content", None))
}

impl OpenAiBackend {
    /// The POST sent for one system/user exchange.
    pub fn build_request(&self, system: &str, user: &str) -> Result<Request> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        Ok(self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .build()?)
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = self.build_request(system, user)?;
        debug!(model = %self.model, prompt_chars = user.len(), "sending chat completion");

        let response = self.client.execute(request).await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error("LLM endpoint", status, &text));
        }

        extract_chat_content(&text)
    }
}
