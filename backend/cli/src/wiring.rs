//! Builds the runtime collaborators from a validated config.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use relaybot_channels::{Dispatcher, FailureMessages, HandlerSettings, LineAdapter, LineClient, LineConfig};
use relaybot_completion::{MockProvider, OpenAiProvider, ProviderRegistry};
use relaybot_config::{BotConfig, Secrets};
use relaybot_core::{LlmProvider, OcrEngine};
use relaybot_logging::LoggingOptions;
use relaybot_understanding::{OcrLanguages, TesseractOcr, VisionOcr};
use tracing::info;

/// Translate the config into what the handlers need.
pub fn handler_settings(config: &BotConfig) -> HandlerSettings {
    let messages = &config.messages;
    HandlerSettings {
        model: config.chat.model().to_string(),
        text_system_prompt: config.chat.text_system_prompt.clone(),
        image_system_prompt: config.chat.image_system_prompt().to_string(),
        max_tokens: config.chat.max_tokens,
        temperature: config.chat.temperature,
        image_ack: messages.image_ack().to_string(),
        failures: FailureMessages {
            completion: messages.completion_error_prefix().to_string(),
            content_fetch: messages.content_error_prefix().to_string(),
            ocr: messages.ocr_error_prefix().to_string(),
            other: messages.generic_error_prefix().to_string(),
        },
    }
}

pub fn logging_options(config: &BotConfig) -> LoggingOptions {
    LoggingOptions {
        level: config.logging.level().to_string(),
        log_dir: config.logging.dir.as_ref().map(Into::into),
        json: config.logging.is_json(),
    }
}

/// Register the available chat providers and pick the configured one.
pub fn build_provider(config: &BotConfig, secrets: &Secrets) -> Result<Arc<dyn LlmProvider>> {
    let mut registry = ProviderRegistry::new();

    if let Some(api_key) = &secrets.chat_api_key {
        let provider = OpenAiProvider::new(api_key).with_base_url(config.chat.base_url());
        registry.register("openai", Arc::new(provider));
    }
    registry.register("mock", Arc::new(MockProvider::new("mock")));

    let name = config.chat.provider();
    let provider = registry.get(name).ok_or_else(|| {
        anyhow!(
            "chat provider '{name}' is not available (registered: {})",
            registry.list().join(", ")
        )
    })?;
    info!(provider = name, model = config.chat.model(), "Chat provider ready");
    Ok(provider)
}

pub fn build_ocr(config: &BotConfig, secrets: &Secrets) -> Result<Arc<dyn OcrEngine>> {
    let ocr = &config.ocr;
    let engine: Arc<dyn OcrEngine> = match ocr.engine() {
        "vision" => {
            let api_key = secrets
                .chat_api_key
                .as_ref()
                .context("vision OCR needs an API key")?;
            Arc::new(
                VisionOcr::new(api_key)
                    .with_model(ocr.vision_model())
                    .with_base_url(config.chat.base_url()),
            )
        }
        _ => {
            let languages = OcrLanguages::parse(ocr.languages())?;
            Arc::new(
                TesseractOcr::new(languages)
                    .with_command(ocr.tesseract_cmd())
                    .with_page_seg_mode(ocr.page_seg_mode),
            )
        }
    };
    info!(engine = engine.name(), "OCR engine ready");
    Ok(engine)
}

/// Wire the LINE adapter with its dispatcher and collaborators.
pub fn build_line_adapter(config: &BotConfig) -> Result<LineAdapter> {
    let secrets = Secrets::from_config(config)?;

    let line_api = LineClient::new(&secrets.channel_access_token)
        .with_api_base(config.line.api_base())
        .with_data_api_base(config.line.data_api_base());
    let provider = build_provider(config, &secrets)?;
    let ocr = build_ocr(config, &secrets)?;

    let dispatcher = Dispatcher::new(Arc::new(line_api), provider, ocr, handler_settings(config));

    Ok(LineAdapter::new(
        LineConfig {
            channel_secret: secrets.channel_secret,
            webhook_path: config.server.webhook_path().to_string(),
        },
        Arc::new(dispatcher),
    ))
}
