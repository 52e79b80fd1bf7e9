//! LINE Webhook Receiver
//!
//! Handles inbound payloads from LINE Messaging API webhooks,
//! including signature validation and event deserialization.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use relaybot_core::BotError;
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the `X-Line-Signature` value for a body: base64(HMAC-SHA256(secret, body)).
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Validates the `x-line-signature` against the local channel secret.
///
/// The digest comparison is constant-time (`Mac::verify_slice`).
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> Result<(), BotError> {
    let provided = STANDARD
        .decode(signature.trim())
        .map_err(|_| BotError::InvalidSignature)?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| BotError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| BotError::InvalidSignature)
}

/// Where an event came from. For group and room chats `user_id` may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

impl EventSource {
    /// Id usable with the push API: the user, else the group, else the room.
    pub fn push_target(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.group_id.as_deref())
            .or(self.room_id.as_deref())
    }
}

/// A parsed webhook event, tagged by message kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Text {
        reply_token: String,
        source: EventSource,
        text: String,
    },
    Image {
        reply_token: String,
        source: EventSource,
        message_id: String,
    },
    /// Follow, postback, sticker, ... Dispatched as a no-op.
    Other {
        event_type: String,
        message_type: Option<String>,
    },
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Text { .. } => "text",
            InboundEvent::Image { .. } => "image",
            InboundEvent::Other { .. } => "other",
        }
    }
}

#[derive(Deserialize)]
struct LineWebhook {
    #[serde(default)]
    #[allow(dead_code)]
    destination: Option<String>,
    events: Vec<LineEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    reply_token: Option<String>,
    #[serde(default)]
    source: Option<EventSource>,
    #[serde(default)]
    message: Option<LineMessage>,
}

#[derive(Deserialize)]
struct LineMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl From<LineEvent> for InboundEvent {
    fn from(ev: LineEvent) -> Self {
        let LineEvent { event_type, reply_token, source, message } = ev;
        let reply_token = reply_token.unwrap_or_default();
        let source = source.unwrap_or_default();
        match (event_type == "message", message) {
            (true, Some(LineMessage { kind, text: Some(text), .. })) if kind == "text" => {
                InboundEvent::Text { reply_token, source, text }
            }
            (true, Some(LineMessage { kind, id: Some(id), .. })) if kind == "image" => {
                InboundEvent::Image { reply_token, source, message_id: id }
            }
            (_, message) => InboundEvent::Other {
                event_type,
                message_type: message.map(|m| m.kind),
            },
        }
    }
}

/// Parse a verified webhook body into events, preserving arrival order.
pub fn parse_events(body: &[u8]) -> Result<Vec<InboundEvent>, BotError> {
    let webhook: LineWebhook =
        serde_json::from_slice(body).map_err(|e| BotError::Parse(e.to_string()))?;
    Ok(webhook.events.into_iter().map(InboundEvent::from).collect())
}
