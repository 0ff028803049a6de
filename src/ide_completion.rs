//! One-shot inline completion for an external editor.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::llmclient::{ChatRequest, LLMClient, DEFAULT_MODEL};

pub const CURSOR_TOKEN: &str = "<CURSOR>";
pub const IDE_TITLE: &str = "SimpleCASCADE IDE";
pub const IDE_TIMEOUT: Duration = Duration::from_secs(20);
const IDE_TEMPERATURE: f32 = 0.2;
const IDE_MAX_TOKENS: u32 = 128;

/// What the editor writes to our stdin.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompletionInput {
    pub content: String,
    /// Character offset of the caret in `content`.
    #[serde(deserialize_with = "lenient_offset")]
    pub cursor: i64,
    pub language: String,
    pub path: String,
}

/// Accepts `12`, `12.0` and `"12"` alike; editors disagree on the encoding.
fn lenient_offset<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    let offset = match &value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    offset.ok_or_else(|| D::Error::custom(format!("cursor is not an integer: {value}")))
}

impl CompletionInput {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Completion input is not a valid JSON object")
    }

    /// Text before and after the caret. Out-of-range offsets are clamped.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        let cursor = usize::try_from(self.cursor.max(0)).unwrap_or(usize::MAX);
        let byte = self
            .content
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len());
        self.content.split_at(byte)
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are a code completion engine. Return ONLY the continuation text that should be inserted at the cursor.\n\
             Language: {}\n\
             File: {}\n\
             Provide short, syntactically correct code.",
            self.language, self.path
        )
    }

    pub fn user_prompt(&self) -> String {
        let (before, after) = self.split_at_cursor();
        format!("{before}{CURSOR_TOKEN}{after}")
    }

    pub fn to_request(&self) -> ChatRequest {
        ChatRequest::new(self.user_prompt())
            .with_system_prompt(self.system_prompt())
            .with_model(DEFAULT_MODEL)
            .with_temperature(IDE_TEMPERATURE)
            .with_max_tokens(IDE_MAX_TOKENS)
    }
}

/// Resolves `raw` stdin to the suggestion text. Any failure yields an empty
/// string so the editor always receives something.
pub async fn suggest(client: &LLMClient, raw: &str) -> String {
    let input = match CompletionInput::from_json(raw) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!("{e:#}");
            return String::new();
        }
    };

    match client.complete(&input.to_request()).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!("completion request failed: {e:#}");
            String::new()
        }
    }
}
