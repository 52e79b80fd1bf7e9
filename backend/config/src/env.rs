//! Environment handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` references inside YAML string values, resolved at load
//!   time. Only uppercase `[A-Z_][A-Z0-9_]*` names match; `$${VAR}` escapes
//!   to a literal `${VAR}`.
//! - Well-known variables (`LINE_CHANNEL_SECRET`, `OPENAI_API_KEY`, ...)
//!   that override the matching config field when set.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::BotConfig;

pub const ENV_LINE_CHANNEL_SECRET: &str = "LINE_CHANNEL_SECRET";
pub const ENV_LINE_CHANNEL_ACCESS_TOKEN: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_BIND: &str = "RELAYBOT_BIND";
pub const ENV_PORT: &str = "RELAYBOT_PORT";
/// Platform-assigned port (Render, Heroku, ...); loses to `RELAYBOT_PORT`.
pub const ENV_PLATFORM_PORT: &str = "PORT";
pub const ENV_WEBHOOK_PATH: &str = "RELAYBOT_WEBHOOK_PATH";
pub const ENV_OCR_LANGUAGES: &str = "OCR_LANGUAGES";
pub const ENV_TESSERACT_CMD: &str = "TESSERACT_CMD";
pub const ENV_LOG_DIR: &str = "RELAYBOT_LOG_DIR";
pub const ENV_LOG_FORMAT: &str = "RELAYBOT_LOG_FORMAT";

/// Matches `${VAR}` and its escaped form `$${VAR}` in one pass.
static ENV_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(\$)?\{([A-Z_][A-Z0-9_]*)\}").expect("env reference pattern is valid")
});

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Snapshot of the process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in a config value tree using a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_REF_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[2];
        if caps.get(1).is_some() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

fn lookup<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn set_from(env: &HashMap<String, String>, key: &str, slot: &mut Option<String>) {
    if let Some(value) = lookup(env, key) {
        *slot = Some(value.to_string());
    }
}

/// Apply well-known environment variables on top of a loaded config.
///
/// Environment wins over the file. Empty values are treated as unset.
pub fn apply_env_overrides(mut config: BotConfig, env: &HashMap<String, String>) -> Result<BotConfig> {
    set_from(env, ENV_LINE_CHANNEL_SECRET, &mut config.line.channel_secret);
    set_from(env, ENV_LINE_CHANNEL_ACCESS_TOKEN, &mut config.line.channel_access_token);
    set_from(env, ENV_OPENAI_API_KEY, &mut config.chat.api_key);
    set_from(env, ENV_OPENAI_MODEL, &mut config.chat.model);
    set_from(env, ENV_OPENAI_BASE_URL, &mut config.chat.base_url);
    set_from(env, ENV_BIND, &mut config.server.bind);
    set_from(env, ENV_WEBHOOK_PATH, &mut config.server.webhook_path);
    set_from(env, ENV_OCR_LANGUAGES, &mut config.ocr.languages);
    set_from(env, ENV_TESSERACT_CMD, &mut config.ocr.tesseract_cmd);
    set_from(env, ENV_LOG_DIR, &mut config.logging.dir);
    set_from(env, ENV_LOG_FORMAT, &mut config.logging.format);

    let port_var = [ENV_PORT, ENV_PLATFORM_PORT]
        .into_iter()
        .find_map(|key| lookup(env, key).map(|value| (key, value)));
    if let Some((key, value)) = port_var {
        let port = value
            .parse::<u16>()
            .with_context(|| format!("{key} must be a port number, got \"{value}\""))?;
        config.server.port = Some(port);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_simple_var() {
        let v = json!({"chat": {"apiKey": "${OPENAI_API_KEY}"}});
        let env = env(&[("OPENAI_API_KEY", "sk-abc123")]);
        let result = resolve_env_vars_with(&v, &env).unwrap();
        assert_eq!(result["chat"]["apiKey"], "sk-abc123");
    }

    #[test]
    fn error_on_missing_var_names_path() {
        let v = json!({"line": {"channelSecret": "${MISSING_VAR}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("MISSING_VAR"), "{err}");
        assert!(err.contains("line.channelSecret"), "{err}");
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!({"prompt": "cost $${PRICE} for ${ITEM}"});
        let env = env(&[("ITEM", "tea")]);
        let result = resolve_env_vars_with(&v, &env).unwrap();
        assert_eq!(result["prompt"], "cost ${PRICE} for tea");
    }

    #[test]
    fn passthrough_non_var_strings_and_primitives() {
        let v = json!({"key": "plain $5", "port": 8000, "tags": ["${A}"]});
        let env = env(&[("A", "x")]);
        let result = resolve_env_vars_with(&v, &env).unwrap();
        assert_eq!(result["key"], "plain $5");
        assert_eq!(result["port"], 8000);
        assert_eq!(result["tags"][0], "x");
    }

    #[test]
    fn overrides_secrets_and_server_fields() {
        let mut cfg = BotConfig::default();
        cfg.line.channel_secret = Some("from-file".into());
        let env = env(&[
            ("LINE_CHANNEL_SECRET", "from-env"),
            ("LINE_CHANNEL_ACCESS_TOKEN", "token"),
            ("OPENAI_API_KEY", "sk-test"),
            ("RELAYBOT_WEBHOOK_PATH", "/webhook"),
            ("PORT", "10000"),
            ("OCR_LANGUAGES", "jpn"),
        ]);
        let cfg = apply_env_overrides(cfg, &env).unwrap();
        assert_eq!(cfg.line.channel_secret.as_deref(), Some("from-env"));
        assert_eq!(cfg.line.channel_access_token.as_deref(), Some("token"));
        assert_eq!(cfg.chat.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.server.webhook_path(), "/webhook");
        assert_eq!(cfg.server.port(), 10000);
        assert_eq!(cfg.ocr.languages(), "jpn");
    }

    #[test]
    fn relaybot_port_beats_platform_port() {
        let env = env(&[("PORT", "10000"), ("RELAYBOT_PORT", "8081")]);
        let cfg = apply_env_overrides(BotConfig::default(), &env).unwrap();
        assert_eq!(cfg.server.port(), 8081);
    }

    #[test]
    fn empty_values_do_not_override() {
        let mut cfg = BotConfig::default();
        cfg.chat.model = Some("gpt-4o".into());
        let cfg = apply_env_overrides(cfg, &env(&[("OPENAI_MODEL", "  ")])).unwrap();
        assert_eq!(cfg.chat.model(), "gpt-4o");
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = apply_env_overrides(BotConfig::default(), &env(&[("PORT", "http")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("PORT must be a port number"), "{err}");
    }
}
