use serde::{Deserialize, Serialize};

/// LINE rejects text messages longer than this many characters.
pub const MAX_TEXT_CHARS: usize = 5000;

/// A single outbound message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text { text: String },
}

impl OutboundMessage {
    /// Build a text message, truncating to the platform limit on a char boundary.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = match text.char_indices().nth(MAX_TEXT_CHARS) {
            Some((cut, _)) => text[..cut].to_string(),
            None => text,
        };
        OutboundMessage::Text { text }
    }

    pub fn as_text(&self) -> &str {
        match self {
            OutboundMessage::Text { text } => text,
        }
    }
}

/// Where a payload is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    /// Single-use reply token taken from the inbound event.
    ReplyToken(String),
    /// User, group or room id for the push API.
    Push(String),
}

/// Outbound contents bound to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPayload {
    pub target: ReplyTarget,
    pub messages: Vec<OutboundMessage>,
}

impl ReplyPayload {
    pub fn reply_text(reply_token: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target: ReplyTarget::ReplyToken(reply_token.into()),
            messages: vec![OutboundMessage::text(text)],
        }
    }

    pub fn push_text(to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target: ReplyTarget::Push(to.into()),
            messages: vec![OutboundMessage::text(text)],
        }
    }
}
