//! relaybot runtime configuration schema.
//!
//! Every section is optional in the YAML file; unset fields fall back to the
//! constants in [`crate::defaults`]. Secrets normally arrive through the
//! environment (see [`crate::env::apply_env_overrides`]).

use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::env::{ENV_LINE_CHANNEL_ACCESS_TOKEN, ENV_LINE_CHANNEL_SECRET, ENV_OPENAI_API_KEY};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// HTTP listener and webhook route
    #[serde(default)]
    pub server: ServerConfig,

    /// LINE Messaging API channel credentials and endpoints
    #[serde(default)]
    pub line: LineChannelConfig,

    /// Chat-completion provider
    #[serde(default)]
    pub chat: ChatConfig,

    /// OCR engine
    #[serde(default)]
    pub ocr: OcrConfig,

    /// User-facing fixed texts
    #[serde(default)]
    pub messages: MessagesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// `/callback` by default; some deployments use `/webhook`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_path: Option<String>,
}

impl ServerConfig {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn webhook_path(&self) -> &str {
        self.webhook_path.as_deref().unwrap_or(DEFAULT_WEBHOOK_PATH)
    }
}

// ---------------------------------------------------------------------------
// LINE
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChannelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_api_base: Option<String>,
}

impl LineChannelConfig {
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_LINE_API_BASE)
    }

    pub fn data_api_base(&self) -> &str {
        self.data_api_base.as_deref().unwrap_or(DEFAULT_LINE_DATA_API_BASE)
    }
}

// ---------------------------------------------------------------------------
// Chat completion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    /// "openai" (any compatible endpoint) or "mock" (echo, no network)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// System prompt for plain text conversations; none by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_system_prompt: Option<String>,
    /// System prompt applied to OCR output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_system_prompt: Option<String>,
}

impl ChatConfig {
    pub fn provider(&self) -> &str {
        self.provider.as_deref().unwrap_or(DEFAULT_CHAT_PROVIDER)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_CHAT_BASE_URL)
    }

    pub fn image_system_prompt(&self) -> &str {
        self.image_system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_SYSTEM_PROMPT)
    }
}

// ---------------------------------------------------------------------------
// OCR
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// "tesseract" or "vision"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Tesseract language hint, e.g. "jpn" or "jpn+eng"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_seg_mode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_model: Option<String>,
}

impl OcrConfig {
    pub fn engine(&self) -> &str {
        self.engine.as_deref().unwrap_or(DEFAULT_OCR_ENGINE)
    }

    pub fn languages(&self) -> &str {
        self.languages.as_deref().unwrap_or(DEFAULT_OCR_LANGUAGES)
    }

    pub fn tesseract_cmd(&self) -> &str {
        self.tesseract_cmd.as_deref().unwrap_or(DEFAULT_TESSERACT_CMD)
    }

    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(DEFAULT_VISION_MODEL)
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_error_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_error_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_error_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_error_prefix: Option<String>,
}

impl MessagesConfig {
    pub fn image_ack(&self) -> &str {
        self.image_ack.as_deref().unwrap_or(DEFAULT_IMAGE_ACK)
    }

    pub fn completion_error_prefix(&self) -> &str {
        self.completion_error_prefix
            .as_deref()
            .unwrap_or(DEFAULT_COMPLETION_ERROR_PREFIX)
    }

    pub fn content_error_prefix(&self) -> &str {
        self.content_error_prefix
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_ERROR_PREFIX)
    }

    pub fn ocr_error_prefix(&self) -> &str {
        self.ocr_error_prefix.as_deref().unwrap_or(DEFAULT_OCR_ERROR_PREFIX)
    }

    pub fn generic_error_prefix(&self) -> &str {
        self.generic_error_prefix
            .as_deref()
            .unwrap_or(DEFAULT_GENERIC_ERROR_PREFIX)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for rolling NDJSON files; console only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// "pretty" or "json"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn is_json(&self) -> bool {
        self.format.as_deref() == Some("json")
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// The three process secrets, extracted after validation.
#[derive(Clone)]
pub struct Secrets {
    pub channel_secret: String,
    pub channel_access_token: String,
    /// Absent only when neither the chat provider nor the OCR engine needs it.
    pub chat_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("channel_secret", &"***")
            .field("channel_access_token", &"***")
            .field("chat_api_key", &self.chat_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

impl Secrets {
    pub fn from_config(config: &BotConfig) -> anyhow::Result<Self> {
        let channel_secret = non_empty(&config.line.channel_secret)
            .ok_or_else(|| anyhow::anyhow!(missing_secret_message(ENV_LINE_CHANNEL_SECRET)))?;
        let channel_access_token = non_empty(&config.line.channel_access_token).ok_or_else(|| {
            anyhow::anyhow!(missing_secret_message(ENV_LINE_CHANNEL_ACCESS_TOKEN))
        })?;
        let chat_api_key = non_empty(&config.chat.api_key);
        if chat_api_key.is_none() && needs_chat_api_key(config) {
            anyhow::bail!(missing_secret_message(ENV_OPENAI_API_KEY));
        }
        Ok(Self {
            channel_secret,
            channel_access_token,
            chat_api_key,
        })
    }
}

/// Whether the configured collaborators call an authenticated chat endpoint.
pub fn needs_chat_api_key(config: &BotConfig) -> bool {
    config.chat.provider() == "openai" || config.ocr.engine() == "vision"
}

pub fn missing_secret_message(var: &str) -> String {
    format!("Specify {var} as environment variable.")
}
