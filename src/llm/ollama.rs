use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Request};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{status_error, ChatBackend};
use crate::config::LlmConfig;
use crate::error::Result;

/// Local Ollama `/api/chat` backend.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url(),
            model: config.model().to_string(),
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

impl OllamaBackend {
    /// The POST sent for one system/user exchange.
    pub fn build_request(&self, system: &str, user: &str) -> Result<Request> {
        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![
                OllamaMessage {
                    role: "system".into(),
                    content: system.into(),
                },
                OllamaMessage {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        Ok(self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .build()?)
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = self.build_request(system, user)?;
        debug!(model = %self.model, "sending request to Ollama");

        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error("Ollama", status, &error_body));
        }

        let chat: OllamaChatResponse = response.json().await?;
        Ok(chat.message.content.trim().to_string())
    }
}
