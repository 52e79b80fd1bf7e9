//! LINE Senders
//!
//! Reply, push and content-download calls against the LINE Messaging API.

use async_trait::async_trait;
use relaybot_core::{BotError, OutboundMessage, ReplyPayload, ReplyTarget};
use relaybot_logging::redact_sensitive_data;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://api.line.me";
pub const DEFAULT_DATA_API_BASE: &str = "https://api-data.line.me";

/// The messaging-platform operations handlers depend on.
#[async_trait]
pub trait LineApi: Send + Sync {
    /// Reply to an event. Reply tokens are single-use and expire quickly.
    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), BotError>;

    /// Push to a user, group or room id. Usable repeatedly.
    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), BotError>;

    /// Download the binary content of a message (image, video, ...).
    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, BotError>;

    /// Deliver a payload through the API matching its target.
    async fn deliver(&self, payload: &ReplyPayload) -> Result<(), BotError> {
        match &payload.target {
            ReplyTarget::ReplyToken(token) => self.reply(token, &payload.messages).await,
            ReplyTarget::Push(to) => self.push(to, &payload.messages).await,
        }
    }
}

/// HTTP client for the LINE Messaging API.
pub struct LineClient {
    http: Client,
    access_token: String,
    api_base: String,
    data_api_base: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: &'a [OutboundMessage],
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: &'a [OutboundMessage],
}

impl LineClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            access_token: access_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            data_api_base: DEFAULT_DATA_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_data_api_base(mut self, url: impl Into<String>) -> Self {
        self.data_api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post_json<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<(), BotError> {
        let resp = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::ReplyDelivery(e.to_string()))?;
        check_status(resp).await.map_err(BotError::ReplyDelivery)?;
        Ok(())
    }
}

/// Turn a non-2xx response into `"<status>: <redacted body>"`.
async fn check_status(resp: Response) -> Result<Response, String> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(format!("{}: {}", status, redact_sensitive_data(body.trim())))
}

#[async_trait]
impl LineApi for LineClient {
    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), BotError> {
        debug!(reply_token, count = messages.len(), "Replying to LINE event");
        self.post_json("/v2/bot/message/reply", &ReplyRequest { reply_token, messages })
            .await
    }

    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), BotError> {
        debug!(to, count = messages.len(), "Pushing LINE message");
        self.post_json("/v2/bot/message/push", &PushRequest { to, messages })
            .await
    }

    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, BotError> {
        let url = format!(
            "{}/v2/bot/message/{}/content",
            self.data_api_base,
            urlencoding::encode(message_id)
        );
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| BotError::ContentFetch(e.to_string()))?;
        let resp = check_status(resp).await.map_err(BotError::ContentFetch)?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BotError::ContentFetch(e.to_string()))?;
        info!(message_id, bytes = bytes.len(), "Fetched LINE message content");
        Ok(bytes.to_vec())
    }
}
