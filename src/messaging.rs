use std::time::Duration;

use axum::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{BotError, BotResult};

#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Sends one text reply for the given single-use reply token.
    async fn reply(&self, reply_token: &str, text: &str) -> BotResult<()>;

    /// Downloads the binary content of a media message.
    async fn get_message_content(&self, message_id: &str) -> BotResult<Bytes>;
}

const API_BASE: &str = "https://api.line.me";
const DATA_BASE: &str = "https://api-data.line.me";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    #[serde(rename = "replyToken")]
    reply_token: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// LINE Messaging API client: reply endpoint on the API host, media content
/// on the data host.
pub struct LineClient {
    http: Client,
    api_base: String,
    data_base: String,
    access_token: String,
}

impl LineClient {
    pub fn new(access_token: &str) -> anyhow::Result<Self> {
        Self::with_base_urls(access_token, API_BASE, DATA_BASE)
    }

    pub fn with_base_urls(
        access_token: &str,
        api_base: &str,
        data_base: &str,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            data_base: data_base.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }
}

#[async_trait]
impl MessagingClient for LineClient {
    async fn reply(&self, reply_token: &str, text: &str) -> BotResult<()> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![TextMessage { kind: "text", text }],
        };
        let resp = self
            .http
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::ReplyDelivery(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            // Expired or already-consumed tokens land here; the caller logs
            // and moves on, a retry cannot succeed.
            let detail = resp.text().await.unwrap_or_default();
            return Err(BotError::ReplyDelivery(format!("status {status}: {detail}")));
        }
        debug!("reply delivered");
        Ok(())
    }

    async fn get_message_content(&self, message_id: &str) -> BotResult<Bytes> {
        let resp = self
            .http
            .get(format!(
                "{}/v2/bot/message/{}/content",
                self.data_base, message_id
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| BotError::MediaFetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BotError::MediaFetch(format!("status {status}")));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BotError::MediaFetch(e.to_string()))?;
        debug!(message_id, size = bytes.len(), "media content downloaded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_request_matches_platform_wire_format() {
        let body = ReplyRequest {
            reply_token: "token-123",
            messages: vec![TextMessage {
                kind: "text",
                text: "叉燒飯 ≈ 650 kcal",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["replyToken"], "token-123");
        assert_eq!(json["messages"][0]["type"], "text");
        assert_eq!(json["messages"][0]["text"], "叉燒飯 ≈ 650 kcal");
    }

    #[test]
    fn base_urls_are_trimmed() {
        let client =
            LineClient::with_base_urls("tok", "https://api.example/", "https://data.example/")
                .unwrap();
        assert_eq!(client.api_base, "https://api.example");
        assert_eq!(client.data_base, "https://data.example");
    }
}
