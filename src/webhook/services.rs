use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use super::events::InboundEvent;
use crate::classify::classify_or_empty;
use crate::error::BotResult;
use crate::nutrition::FoodRecord;
use crate::state::AppState;

/// Degraded reply when the chat provider is down. An unanswered message is a
/// worse experience than an honest apology.
pub const CHAT_APOLOGY: &str = "抱歉，我現在回覆不過來，請稍後再傳一次！";

/// Processes one delivery batch sequentially, in arrival order. A failure in
/// one event never aborts the rest of the batch: every fallible step below
/// degrades to a reply or a log line.
pub async fn process_events(state: &AppState, events: Vec<InboundEvent>) {
    for event in events {
        match event {
            InboundEvent::Text { reply_token, text } => {
                handle_text(state, &reply_token, &text).await;
            }
            InboundEvent::Image {
                reply_token,
                message_id,
            } => {
                handle_image(state, &reply_token, &message_id).await;
            }
        }
    }
}

async fn handle_text(state: &AppState, reply_token: &str, text: &str) {
    let text = text.trim();
    let reply = match state.nutrition.lookup(text) {
        Some(record) => nutrition_reply(record),
        None => match state.chat.chat(text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat fallback failed, sending apology");
                CHAT_APOLOGY.to_string()
            }
        },
    };
    safe_reply(state, reply_token, &reply).await;
}

async fn handle_image(state: &AppState, reply_token: &str, message_id: &str) {
    let label = match download_media(state, message_id).await {
        // The temp file lives exactly as long as this arm: dropped (and
        // deleted) as soon as classification returns, on success or failure.
        Ok(tmp) => classify_or_empty(state.classifier.as_ref(), tmp.path()).await,
        Err(e) => {
            warn!(error = %e, message_id, "media download failed, degrading to unknown food");
            String::new()
        }
    };

    let reply = match state.nutrition.lookup(&label) {
        Some(record) => nutrition_reply(record),
        None => unknown_food_reply(&label),
    };
    safe_reply(state, reply_token, &reply).await;
}

async fn download_media(state: &AppState, message_id: &str) -> BotResult<NamedTempFile> {
    let bytes = state.messaging.get_message_content(message_id).await?;
    let tmp = NamedTempFile::new()
        .map_err(|e| crate::error::BotError::MediaFetch(e.to_string()))?;
    tokio::fs::write(tmp.path(), &bytes)
        .await
        .map_err(|e| crate::error::BotError::MediaFetch(e.to_string()))?;
    Ok(tmp)
}

fn nutrition_reply(record: &FoodRecord) -> String {
    format!(
        "{} ≈ {} kcal\n蛋白質 {} g、脂肪 {} g\n建議：{}",
        record.name, record.kcal, record.protein, record.fat, record.advice
    )
}

fn unknown_food_reply(label: &str) -> String {
    if label.is_empty() {
        "看不太出來這是什麼食物，換一張清楚一點的照片試試？".to_string()
    } else {
        format!("辨識到「{label}」，但暫時沒有營養資料 QQ")
    }
}

async fn safe_reply(state: &AppState, reply_token: &str, text: &str) {
    match state.messaging.reply(reply_token, text).await {
        Ok(()) => info!(reply_token, "reply sent"),
        // Token expired or already consumed: log and move on, nothing to retry.
        Err(e) => error!(error = %e, reply_token, "reply delivery failed"),
    }
}
