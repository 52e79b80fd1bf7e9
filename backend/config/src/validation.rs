//! Config validation: collects every problem in one pass with field paths.

use crate::env::{ENV_LINE_CHANNEL_ACCESS_TOKEN, ENV_LINE_CHANNEL_SECRET, ENV_OPENAI_API_KEY};
use crate::schema::{missing_secret_message, needs_chat_api_key, BotConfig};
use relaybot_understanding::OcrLanguages;
use thiserror::Error;

pub const CHAT_PROVIDERS: &[&str] = &["openai", "mock"];
pub const OCR_ENGINES: &[&str] = &["tesseract", "vision"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_secrets(config, &mut report);
    validate_server(config, &mut report);
    validate_chat(config, &mut report);
    validate_ocr(config, &mut report);
    report
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map(str::is_empty).unwrap_or(true)
}

fn validate_secrets(config: &BotConfig, report: &mut ValidationReport) {
    if is_blank(&config.line.channel_secret) {
        report.error(
            "line.channelSecret",
            missing_secret_message(ENV_LINE_CHANNEL_SECRET),
        );
    }
    if is_blank(&config.line.channel_access_token) {
        report.error(
            "line.channelAccessToken",
            missing_secret_message(ENV_LINE_CHANNEL_ACCESS_TOKEN),
        );
    }
    if needs_chat_api_key(config) && is_blank(&config.chat.api_key) {
        report.error("chat.apiKey", missing_secret_message(ENV_OPENAI_API_KEY));
    }
}

fn validate_server(config: &BotConfig, report: &mut ValidationReport) {
    let port = config.server.port();
    if port == 0 {
        report.error("server.port", "port must be between 1 and 65535");
    } else if port < 1024 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }

    let path = config.server.webhook_path();
    if !path.starts_with('/') || path.len() < 2 {
        report.error(
            "server.webhookPath",
            format!("webhook path '{path}' must start with '/' and name a route"),
        );
    }
}

fn validate_chat(config: &BotConfig, report: &mut ValidationReport) {
    let provider = config.chat.provider();
    if !CHAT_PROVIDERS.contains(&provider) {
        report.error(
            "chat.provider",
            format!("Unknown chat provider '{provider}'. Use 'openai' or 'mock'"),
        );
    }
    if config.chat.model().trim().is_empty() {
        report.error("chat.model", "model cannot be empty");
    }
    if let Some(t) = config.chat.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("chat.temperature", format!("temperature {t} is outside 0.0..=2.0"));
        }
    }
    if config.chat.max_tokens == Some(0) {
        report.error("chat.maxTokens", "maxTokens must be >= 1");
    }
}

fn validate_ocr(config: &BotConfig, report: &mut ValidationReport) {
    let engine = config.ocr.engine();
    if !OCR_ENGINES.contains(&engine) {
        report.error(
            "ocr.engine",
            format!("Unknown OCR engine '{engine}'. Use 'tesseract' or 'vision'"),
        );
    }

    let languages = config.ocr.languages();
    if let Err(err) = OcrLanguages::parse(languages) {
        report.error(
            "ocr.languages",
            format!("{err} in '{languages}'; use codes like 'jpn+eng'"),
        );
    }

    if let Some(psm) = config.ocr.page_seg_mode {
        if psm > 13 {
            report.error("ocr.pageSegMode", format!("page segmentation mode {psm} is outside 0..=13"));
        }
    }
}
