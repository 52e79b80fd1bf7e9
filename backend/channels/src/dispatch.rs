//! Event dispatch and the text / image handlers.
//!
//! Events of one webhook request are handled sequentially in arrival order.
//! Handlers never return errors: every collaborator failure is turned into a
//! user-visible message by [`failure_message`], and delivery failures are
//! logged.

use std::sync::Arc;

use relaybot_core::{
    BotError, LlmProvider, LlmRequest, OcrEngine, OutboundMessage, ReplyPayload,
};
use relaybot_logging::redact_sensitive_data;
use tracing::{debug, error, info, instrument, warn};

use crate::line_receive::{EventSource, InboundEvent};
use crate::line_send::LineApi;

/// Prefixes put in front of the error detail in failure messages.
#[derive(Debug, Clone)]
pub struct FailureMessages {
    pub completion: String,
    pub content_fetch: String,
    pub ocr: String,
    pub other: String,
}

/// Everything the handlers need besides their collaborators.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub model: String,
    /// Prepended to text conversations when set.
    pub text_system_prompt: Option<String>,
    /// Biases image analysis toward race prediction.
    pub image_system_prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Best-effort acknowledgment sent before processing an image.
    pub image_ack: String,
    pub failures: FailureMessages,
}

/// The single place mapping handler errors to what the user reads.
pub fn failure_message(err: &BotError, messages: &FailureMessages) -> String {
    let prefix = match err {
        BotError::ContentFetch(_) => &messages.content_fetch,
        BotError::Ocr(_) => &messages.ocr,
        BotError::Completion { .. } => &messages.completion,
        _ => &messages.other,
    };
    format!("{} {}", prefix, err.detail())
}

/// Per-request dispatch counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub text: usize,
    pub image: usize,
    pub skipped: usize,
}

pub struct Dispatcher {
    api: Arc<dyn LineApi>,
    llm: Arc<dyn LlmProvider>,
    ocr: Arc<dyn OcrEngine>,
    settings: HandlerSettings,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn LineApi>,
        llm: Arc<dyn LlmProvider>,
        ocr: Arc<dyn OcrEngine>,
        settings: HandlerSettings,
    ) -> Self {
        Self { api, llm, ocr, settings }
    }

    /// Run every event to completion, in order. Unknown kinds are skipped.
    pub async fn dispatch(&self, events: Vec<InboundEvent>) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for event in events {
            debug!(kind = event.kind(), "Dispatching LINE event");
            match event {
                InboundEvent::Text { reply_token, text, .. } => {
                    self.handle_text(&reply_token, &text).await;
                    summary.text += 1;
                }
                InboundEvent::Image { reply_token, source, message_id } => {
                    self.handle_image(&reply_token, &source, &message_id).await;
                    summary.image += 1;
                }
                InboundEvent::Other { event_type, message_type } => {
                    debug!(event_type = %event_type, ?message_type, "Skipping unhandled LINE event");
                    summary.skipped += 1;
                }
            }
        }
        summary
    }

    /// Forward the text to the chat model and reply with the answer (or the failure).
    #[instrument(skip_all, fields(reply_token = %reply_token))]
    pub async fn handle_text(&self, reply_token: &str, text: &str) {
        let answer = match self
            .complete(text, self.settings.text_system_prompt.as_deref())
            .await
        {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "Text completion failed");
                failure_message(&err, &self.settings.failures)
            }
        };
        self.deliver(ReplyPayload::reply_text(reply_token, answer)).await;
    }

    /// Ack, fetch, OCR, predict, then push the outcome to the source.
    #[instrument(skip_all, fields(message_id = %message_id))]
    pub async fn handle_image(&self, reply_token: &str, source: &EventSource, message_id: &str) {
        let ack = [OutboundMessage::text(self.settings.image_ack.as_str())];
        if let Err(err) = self.api.reply(reply_token, &ack).await {
            warn!(error = %err, "Image acknowledgment skipped");
        }

        let outcome = match self.analyze_image(message_id).await {
            Ok(prediction) => prediction,
            Err(err) => {
                warn!(error = %err, "Image analysis failed");
                failure_message(&err, &self.settings.failures)
            }
        };

        match source.push_target() {
            Some(to) => self.deliver(ReplyPayload::push_text(to, outcome)).await,
            None => error!("Image event has no push target; dropping result"),
        }
    }

    async fn analyze_image(&self, message_id: &str) -> Result<String, BotError> {
        let image = self.api.fetch_content(message_id).await?;

        let text = self
            .ocr
            .extract_text(&image)
            .await
            .map_err(|e| BotError::Ocr(redact_sensitive_data(&format!("{e:#}"))))?;
        if text.trim().is_empty() {
            return Err(BotError::Ocr("no text detected in image".into()));
        }
        info!(engine = self.ocr.name(), chars = text.chars().count(), "OCR extracted text");

        self.complete(&text, Some(&self.settings.image_system_prompt))
            .await
    }

    async fn complete(&self, text: &str, system_prompt: Option<&str>) -> Result<String, BotError> {
        let mut request = LlmRequest::user(&self.settings.model, text)
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature);
        if let Some(prompt) = system_prompt {
            request = request.with_system(prompt);
        }

        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| BotError::Completion {
                provider: self.llm.name().to_string(),
                message: redact_sensitive_data(&format!("{e:#}")),
            })?;
        info!(
            provider = %response.provider,
            model = %response.model,
            tokens_used = response.tokens_used,
            latency_ms = response.latency_ms,
            "Chat completion succeeded"
        );
        Ok(response.content)
    }

    async fn deliver(&self, payload: ReplyPayload) {
        if let Err(err) = self.api.deliver(&payload).await {
            error!(error = %err, target = ?payload.target, "Failed to deliver LINE message");
        }
    }
}
