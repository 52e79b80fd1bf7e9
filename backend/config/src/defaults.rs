//! Config defaults: constants and their application to a parsed config.

use crate::schema::BotConfig;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_WEBHOOK_PATH: &str = "/callback";

pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";
pub const DEFAULT_LINE_DATA_API_BASE: &str = "https://api-data.line.me";

pub const DEFAULT_CHAT_PROVIDER: &str = "openai";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_SYSTEM_PROMPT: &str = "You are an expert horse racing analyst. \
The user message is text read by OCR from a race card or odds screen and may contain \
recognition errors. Identify the race and runners, then predict the likely top three \
finishers with a short reason for each, and suggest one bet.";

pub const DEFAULT_OCR_ENGINE: &str = "tesseract";
pub const DEFAULT_OCR_LANGUAGES: &str = "jpn+eng";
pub use relaybot_understanding::ocr::DEFAULT_TESSERACT_COMMAND as DEFAULT_TESSERACT_CMD;
pub use relaybot_understanding::vision::DEFAULT_VISION_MODEL;

pub const DEFAULT_IMAGE_ACK: &str = "Image received. Processing...";
pub const DEFAULT_COMPLETION_ERROR_PREFIX: &str = "[AI error]";
pub const DEFAULT_CONTENT_ERROR_PREFIX: &str = "[Image download error]";
pub const DEFAULT_OCR_ERROR_PREFIX: &str = "[OCR error]";
pub const DEFAULT_GENERIC_ERROR_PREFIX: &str = "[Error]";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config, so that a dumped config
/// shows the effective values.
pub fn apply_all_defaults(config: BotConfig) -> BotConfig {
    let config = apply_server_defaults(config);
    let config = apply_line_defaults(config);
    let config = apply_chat_defaults(config);
    let config = apply_ocr_defaults(config);
    let config = apply_message_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: BotConfig) -> BotConfig {
    let server = &mut config.server;
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server
        .webhook_path
        .get_or_insert_with(|| DEFAULT_WEBHOOK_PATH.to_string());
    config
}

fn apply_line_defaults(mut config: BotConfig) -> BotConfig {
    let line = &mut config.line;
    line.api_base
        .get_or_insert_with(|| DEFAULT_LINE_API_BASE.to_string());
    line.data_api_base
        .get_or_insert_with(|| DEFAULT_LINE_DATA_API_BASE.to_string());
    config
}

fn apply_chat_defaults(mut config: BotConfig) -> BotConfig {
    let chat = &mut config.chat;
    chat.provider
        .get_or_insert_with(|| DEFAULT_CHAT_PROVIDER.to_string());
    chat.model.get_or_insert_with(|| DEFAULT_CHAT_MODEL.to_string());
    chat.base_url
        .get_or_insert_with(|| DEFAULT_CHAT_BASE_URL.to_string());
    chat.image_system_prompt
        .get_or_insert_with(|| DEFAULT_IMAGE_SYSTEM_PROMPT.to_string());
    config
}

fn apply_ocr_defaults(mut config: BotConfig) -> BotConfig {
    let ocr = &mut config.ocr;
    ocr.engine.get_or_insert_with(|| DEFAULT_OCR_ENGINE.to_string());
    ocr.languages
        .get_or_insert_with(|| DEFAULT_OCR_LANGUAGES.to_string());
    ocr.tesseract_cmd
        .get_or_insert_with(|| DEFAULT_TESSERACT_CMD.to_string());
    config
}

fn apply_message_defaults(mut config: BotConfig) -> BotConfig {
    let messages = &mut config.messages;
    messages
        .image_ack
        .get_or_insert_with(|| DEFAULT_IMAGE_ACK.to_string());
    messages
        .completion_error_prefix
        .get_or_insert_with(|| DEFAULT_COMPLETION_ERROR_PREFIX.to_string());
    messages
        .content_error_prefix
        .get_or_insert_with(|| DEFAULT_CONTENT_ERROR_PREFIX.to_string());
    messages
        .ocr_error_prefix
        .get_or_insert_with(|| DEFAULT_OCR_ERROR_PREFIX.to_string());
    messages
        .generic_error_prefix
        .get_or_insert_with(|| DEFAULT_GENERIC_ERROR_PREFIX.to_string());
    config
}

fn apply_logging_defaults(mut config: BotConfig) -> BotConfig {
    config
        .logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}
