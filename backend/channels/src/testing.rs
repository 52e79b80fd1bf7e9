//! Recording fakes for the dispatcher's collaborators.

use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;
use relaybot_core::{
    BotError, LlmProvider, LlmRequest, LlmResponse, OcrEngine, OutboundMessage,
};

use crate::dispatch::{FailureMessages, HandlerSettings};
use crate::line_send::LineApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Reply { token: String, text: String },
    Push { to: String, text: String },
    Fetch { message_id: String },
}

#[derive(Default)]
pub struct RecordingApi {
    pub calls: Mutex<Vec<Call>>,
    pub fail_reply: bool,
    pub fail_fetch: bool,
}

impl RecordingApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn joined(messages: &[OutboundMessage]) -> String {
    messages
        .iter()
        .map(OutboundMessage::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl LineApi for RecordingApi {
    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), BotError> {
        self.calls.lock().unwrap().push(Call::Reply {
            token: reply_token.to_string(),
            text: joined(messages),
        });
        if self.fail_reply {
            return Err(BotError::ReplyDelivery("400: Invalid reply token".into()));
        }
        Ok(())
    }

    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), BotError> {
        self.calls.lock().unwrap().push(Call::Push {
            to: to.to_string(),
            text: joined(messages),
        });
        Ok(())
    }

    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, BotError> {
        self.calls.lock().unwrap().push(Call::Fetch {
            message_id: message_id.to_string(),
        });
        if self.fail_fetch {
            return Err(BotError::ContentFetch("404 Not Found".into()));
        }
        Ok(b"\x89PNG fake".to_vec())
    }
}

/// Answers `"answer: <last message>"`, or fails when `fail` is set.
#[derive(Default)]
pub struct RecordingLlm {
    pub requests: Mutex<Vec<LlmRequest>>,
    pub fail: bool,
}

impl RecordingLlm {
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            bail!("rate limit exceeded");
        }
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(LlmResponse {
            content: format!("answer: {last}"),
            provider: "recording".into(),
            model: request.model.clone(),
            tokens_used: 1,
            latency_ms: 1,
        })
    }
}

/// Returns fixed text, or fails when `result` is `Err`.
pub struct FixedOcr {
    pub result: Result<String, String>,
    pub calls: Mutex<usize>,
}

impl FixedOcr {
    pub fn ok(text: &str) -> Self {
        Self { result: Ok(text.to_string()), calls: Mutex::new(0) }
    }

    pub fn failing(detail: &str) -> Self {
        Self { result: Err(detail.to_string()), calls: Mutex::new(0) }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl OcrEngine for FixedOcr {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn extract_text(&self, _image: &[u8]) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        match &self.result {
            Ok(text) => Ok(text.clone()),
            Err(detail) => bail!("{detail}"),
        }
    }
}

pub fn settings() -> HandlerSettings {
    HandlerSettings {
        model: "gpt-test".into(),
        text_system_prompt: None,
        image_system_prompt: "You are a horse racing analyst.".into(),
        max_tokens: None,
        temperature: None,
        image_ack: "Image received. Processing...".into(),
        failures: FailureMessages {
            completion: "[AI error]".into(),
            content_fetch: "[Image download error]".into(),
            ocr: "[OCR error]".into(),
            other: "[Error]".into(),
        },
    }
}
