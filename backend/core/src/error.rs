use thiserror::Error;

/// Top-level error type for the relaybot runtime.
///
/// `InvalidSignature` and `Parse` are request-boundary errors (HTTP 400).
/// `ContentFetch`, `Ocr` and `Completion` are caught inside handlers and turned
/// into a user-visible message. `ReplyDelivery` is only ever logged.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("malformed webhook body: {0}")]
    Parse(String),

    #[error("content fetch failed: {0}")]
    ContentFetch(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("chat completion failed ({provider}): {message}")]
    Completion { provider: String, message: String },

    #[error("reply delivery failed: {0}")]
    ReplyDelivery(String),
}

impl BotError {
    /// The underlying detail without the variant's own prefix, for embedding
    /// into user-facing failure messages.
    pub fn detail(&self) -> String {
        match self {
            BotError::Parse(d)
            | BotError::ContentFetch(d)
            | BotError::Ocr(d)
            | BotError::ReplyDelivery(d) => d.clone(),
            BotError::Completion { message, .. } => message.clone(),
            BotError::InvalidSignature => self.to_string(),
        }
    }
}
