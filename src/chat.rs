use std::time::Duration;

use axum::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BotError, BotResult};

/// Fixed system persona for the conversational fallback.
pub const SYSTEM_PERSONA: &str =
    "你是一個溫暖的飲食小幫手。回答時先簡短回應使用者，再附一句飲食小提醒。";

const CHAT_TEMPERATURE: f64 = 0.8;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends the persona plus the user's text to the completion provider and
    /// returns the trimmed reply.
    async fn chat(&self, user_text: &str) -> BotResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// OpenAI chat-completion client. The model identifier comes from
/// configuration so it can be swapped without touching code.
pub struct OpenAiChat {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_key: &str, model: &str) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn chat(&self, user_text: &str) -> BotResult<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PERSONA,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: CHAT_TEMPERATURE,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Chat(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::Chat(format!("status {status}: {body}")));
        }

        let body: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| BotError::Chat(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        debug!(model = %self.model, chars = content.len(), "chat completion received");
        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_persona_and_temperature() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PERSONA,
                },
                ChatMessage {
                    role: "user",
                    content: "今天吃什麼好",
                },
            ],
            temperature: CHAT_TEMPERATURE,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["temperature"], 0.8);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], SYSTEM_PERSONA);
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn response_parses_first_choice() {
        let raw = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "  多喝水喔！  "}}
            ],
            "usage": {"total_tokens": 42}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let content = parsed.choices.into_iter().next().unwrap().message.content;
        assert_eq!(content.trim(), "多喝水喔！");
    }

    #[test]
    fn empty_choices_degrade_to_empty_content() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
