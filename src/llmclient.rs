use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::settings::Settings;

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "qwen/qwen-turbo";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const REFERER: &str = "http://localhost";

/// Prefix of every reply produced from a failed call.
pub const FAILURE_MARKER: &str = "❌ ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// One outbound completion call. Built once, consumed by a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            user_prompt: user_prompt.into(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        self.system_prompt = if system_prompt.is_empty() {
            None
        } else {
            Some(system_prompt)
        };
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The optional system message followed by the user message.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: self.user_prompt.clone(),
        });
        messages
    }

    pub fn body(&self) -> ChatBody {
        ChatBody {
            model: self.model.clone(),
            messages: self.messages(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

/// Picks the key to send: the environment value first, then the persisted one.
/// Blank values count as absent.
pub fn resolve_api_key(env_key: Option<String>, settings: &Settings) -> Option<String> {
    env_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| {
            let stored = settings.api_key.trim();
            (!stored.is_empty()).then(|| stored.to_string())
        })
}

pub fn api_key_from_env(settings: &Settings) -> Option<String> {
    resolve_api_key(std::env::var(API_KEY_ENV).ok(), settings)
}

pub fn is_failure(reply: &str) -> bool {
    reply.starts_with(FAILURE_MARKER)
}

#[derive(Clone)]
pub struct LLMClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    title: String,
}

impl LLMClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>, title: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("failed to build HTTP client ({e}); requests will have no timeout");
                Client::new()
            });

        Self {
            client,
            url: url.into(),
            api_key,
            title: title.into(),
        }
    }

    /// Sends the request and returns the first choice's content.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String> {
        tracing::info!(model = %request.model, url = %self.url, "sending completion request");

        let mut builder = self
            .client
            .post(&self.url)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", &self.title)
            .json(&request.body());
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        } else {
            tracing::debug!("no API key configured, sending without Authorization header");
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", self.url))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "completion request rejected");
            return Err(anyhow::anyhow!("Request failed with status {}: {}", status.as_u16(), error_text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse completion response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Completion response contained no message content")
    }

    /// Same call as [`complete`](Self::complete), but failures come back as
    /// displayable text starting with [`FAILURE_MARKER`].
    pub async fn ask(&self, request: &ChatRequest) -> String {
        match self.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("completion failed: {e:#}");
                format!("{FAILURE_MARKER}{e:#}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_put_system_before_user() {
        let request = ChatRequest::new("make a cube").with_system_prompt("you write OBJ");
        let messages = request.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "you write OBJ");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "make a cube");
    }

    #[test]
    fn empty_system_prompt_is_omitted() {
        let request = ChatRequest::new("hi").with_system_prompt("");
        assert_eq!(request.system_prompt, None);
        assert_eq!(request.messages().len(), 1);
    }

    #[test]
    fn body_serializes_wire_fields() {
        let request = ChatRequest::new("hi")
            .with_model("m")
            .with_temperature(0.2)
            .with_max_tokens(128);
        let value = serde_json::to_value(request.body()).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["max_tokens"], 128);
        assert_eq!(value["messages"][0]["role"], "user");
        assert!((value["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn env_key_takes_priority() {
        let settings = Settings {
            api_key: "stored".to_string(),
            ..Settings::default()
        };
        assert_eq!(resolve_api_key(Some(" env ".to_string()), &settings).as_deref(), Some("env"));
        assert_eq!(resolve_api_key(Some("   ".to_string()), &settings).as_deref(), Some("stored"));
        assert_eq!(resolve_api_key(None, &settings).as_deref(), Some("stored"));
    }

    #[test]
    fn missing_key_is_not_an_error() {
        assert_eq!(resolve_api_key(None, &Settings::default()), None);
    }

    #[test]
    fn failure_marker_detection() {
        assert!(is_failure(&format!("{FAILURE_MARKER}boom")));
        assert!(!is_failure("v 0 0 0"));
    }
}
