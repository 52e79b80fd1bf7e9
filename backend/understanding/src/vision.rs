/// Vision OCR — transcribe image text with an OpenAI-compatible vision model.
///
/// An alternative to the local tesseract engine for hosts without it.
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use relaybot_core::OcrEngine;
use tracing::info;

pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";

const TRANSCRIBE_PROMPT: &str = "Transcribe all text visible in this image verbatim, \
preserving line breaks. Output only the transcribed text.";

pub struct VisionOcr {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl VisionOcr {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_VISION_MODEL.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Guess an image MIME type from its magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl OcrEngine for VisionOcr {
    fn name(&self) -> &str {
        "vision"
    }

    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        let mime = sniff_mime(image);
        info!(model = %self.model, mime, bytes = image.len(), "[Vision] Transcribing image");
        let b64 = STANDARD.encode(image);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": TRANSCRIBE_PROMPT },
                    { "type": "image_url",
                      "image_url": { "url": format!("data:{mime};base64,{b64}") } }
                ]
            }],
            "max_tokens": 1024
        });
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("vision request failed")?;
        let status = resp.status();
        if !status.is_success() {
            bail!("vision model returned {}: {}", status, resp.text().await.unwrap_or_default());
        }
        let json: serde_json::Value = resp.json().await.context("invalid vision response")?;
        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .context("vision response contained no text")?;
        Ok(crate::ocr::normalize_text(text))
    }
}
