pub mod error;
pub mod message;
pub mod traits;

pub use error::BotError;
pub use message::{OutboundMessage, ReplyPayload, ReplyTarget, MAX_TEXT_CHARS};
pub use traits::{ChatMessage, ChatRole, LlmProvider, LlmRequest, LlmResponse, OcrEngine};
