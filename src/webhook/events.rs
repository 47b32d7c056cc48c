use serde::Deserialize;
use tracing::debug;

use crate::error::{BotError, BotResult};

/// Raw platform delivery: a batch of events in arrival order.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub message: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text { id: String, text: String },
    Image { id: String },
    /// Stickers, audio, location, video… anything we don't answer.
    #[serde(other)]
    Unsupported,
}

/// One parsed unit of delivery requiring a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Text {
        reply_token: String,
        text: String,
    },
    Image {
        reply_token: String,
        message_id: String,
    },
}

pub fn parse_events(body: &[u8]) -> BotResult<Vec<InboundEvent>> {
    let payload: WebhookPayload =
        serde_json::from_slice(body).map_err(BotError::MalformedPayload)?;
    Ok(extract_events(payload))
}

/// Keeps text and image message events, in payload order. Everything else is
/// skipped under an explicit policy: follow/unfollow/postback deliveries and
/// unsupported message types get a debug log and no reply.
fn extract_events(payload: WebhookPayload) -> Vec<InboundEvent> {
    let mut out = Vec::new();
    for event in payload.events {
        if event.event_type != "message" {
            debug!(event_type = %event.event_type, "skipping non-message event");
            continue;
        }
        let Some(reply_token) = event.reply_token else {
            debug!("skipping message event without reply token");
            continue;
        };
        match event.message {
            Some(MessagePayload::Text { text, .. }) => {
                out.push(InboundEvent::Text { reply_token, text });
            }
            Some(MessagePayload::Image { id }) => {
                out.push(InboundEvent::Image {
                    reply_token,
                    message_id: id,
                });
            }
            Some(MessagePayload::Unsupported) | None => {
                debug!("skipping unsupported message type");
            }
        }
    }
    out
}
