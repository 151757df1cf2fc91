use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{http_client, ProviderError, TextProvider};
use crate::config::ProviderSettings;

pub const OPENROUTER_ID: &str = "openrouter";

/// OpenRouter's OpenAI-compatible chat completions endpoint.
pub struct OpenRouterProvider {
    client: Client,
    settings: ProviderSettings,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
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

impl OpenRouterProvider {
    pub fn new(settings: ProviderSettings, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self { client: http_client(timeout)?, settings, timeout })
    }
}

#[async_trait]
impl TextProvider for OpenRouterProvider {
    fn id(&self) -> &str { OPENROUTER_ID }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        info!("🔗 OpenRouter request to: {} (model {})", url, self.settings.model);

        let body = ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage { role: "user", content: prompt }],
        };

        let response = self.client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;
        info!("📥 OpenRouter response status: {}", status);

        if !status.is_success() {
            error!("❌ OpenRouter API failed with status {}: {}", status, crate::normalize::preview(&response_text, 200));
            return Err(ProviderError::from_status(status, response_text));
        }

        let parsed: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed.choices.into_iter().next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("No message content in response".to_string()))
    }
}
