//! Config file discovery and loading.

use crate::schema::BotConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Env var naming the config directory.
pub const ENV_CONFIG_DIR: &str = "RELAYBOT_CONFIG_DIR";

/// Resolve the relaybot config directory.
/// Priority: `RELAYBOT_CONFIG_DIR` env > `~/.relaybot/` > `./.relaybot`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".relaybot"))
        .unwrap_or_else(|| PathBuf::from(".relaybot"))
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the config file as an untyped value tree.
///
/// Returns an empty object if the file doesn't exist, so a deployment can be
/// configured through the environment alone.
pub async fn load_config_value(path: &Path) -> Result<Value> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}

/// Load and parse the config from disk without env processing.
pub async fn load_config(path: &Path) -> Result<BotConfig> {
    let value = load_config_value(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid config structure in: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.yaml")).await.unwrap();
        assert!(cfg.line.channel_secret.is_none());
        assert_eq!(cfg.server.port(), 8000);
    }

    #[tokio::test]
    async fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "").unwrap();
        let cfg = load_config(&path).await.unwrap();
        assert_eq!(cfg.server.webhook_path(), "/callback");
    }

    #[tokio::test]
    async fn reads_yaml_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(
            &path,
            "server:\n  webhookPath: /webhook\nmessages:\n  imageAck: Working on it\n",
        )
        .unwrap();
        let cfg = load_config(&path).await.unwrap();
        assert_eq!(cfg.server.webhook_path(), "/webhook");
        assert_eq!(cfg.messages.image_ack(), "Working on it");
    }

    #[tokio::test]
    async fn broken_yaml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "server: [unclosed").unwrap();
        let err = load_config(&path).await.unwrap_err();
        assert!(format!("{err:#}").contains("config.yaml"));
    }
}
