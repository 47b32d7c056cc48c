use thiserror::Error;

/// Failure taxonomy for everything past the HTTP boundary. Soft kinds
/// (classifier, chat, reply delivery, media fetch) are degraded by the
/// dispatcher and never abort a delivery batch.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("classifier call failed: {0}")]
    Classifier(String),

    #[error("chat provider call failed: {0}")]
    Chat(String),

    #[error("reply delivery failed: {0}")]
    ReplyDelivery(String),

    #[error("media fetch failed: {0}")]
    MediaFetch(String),
}

pub type BotResult<T> = Result<T, BotError>;
