//! `relaybot check-config`: report every config problem at once and show
//! the effective settings with secrets masked.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use relaybot_config::{
    BotConfig, ValidationReport, apply_all_defaults, apply_env_overrides, load_config_value,
    redact, resolve_env_vars_with, validate,
};
use serde_json::Value;
use tokio::process::Command;

use crate::terminal_output::{note_error, note_info, note_success, note_warn, render_settings};

/// Runs all checks; `Ok(false)` when the config would not start a server.
pub async fn run(path: &Path, env: &HashMap<String, String>) -> Result<bool> {
    note_info(&format!("Config file: {}", path.display()));

    let value = load_config_value(path).await?;
    let value = resolve_env_vars_with(&value, env)?;
    let config: BotConfig =
        serde_json::from_value(value).context("Invalid config structure")?;
    let config = apply_env_overrides(config, env)?;

    let report = validate(&config);
    print_report(&report);
    print_settings(&config)?;

    let mut ok = report.is_valid();
    if config.ocr.engine() == "tesseract" {
        ok &= check_tesseract(config.ocr.tesseract_cmd()).await;
    }

    println!();
    if ok {
        note_success("Config is ready to serve.");
    } else {
        note_error("Some checks failed. Fix the errors above.");
    }
    Ok(ok)
}

fn print_report(report: &ValidationReport) {
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
}

fn print_settings(config: &BotConfig) -> Result<()> {
    let rows = settings_rows(config)?;
    println!("\nEffective settings:\n{}", render_settings(&rows));
    Ok(())
}

/// Rows of the effective config: defaults filled in, secrets masked.
fn settings_rows(config: &BotConfig) -> Result<Vec<(&'static str, String)>> {
    let effective = redact(&serde_json::to_value(apply_all_defaults(config.clone()))?);
    let field = |section: &str, key: &str| match &effective[section][key] {
        Value::Null => "(unset)".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    Ok(vec![
        ("listen", format!("{}:{}", field("server", "bind"), field("server", "port"))),
        ("webhook path", field("server", "webhookPath")),
        ("channel secret", field("line", "channelSecret")),
        ("access token", field("line", "channelAccessToken")),
        ("chat provider", field("chat", "provider")),
        ("chat model", field("chat", "model")),
        ("chat api key", field("chat", "apiKey")),
        ("ocr engine", field("ocr", "engine")),
        ("ocr languages", field("ocr", "languages")),
        ("image ack", field("messages", "imageAck")),
        ("log level", field("logging", "level")),
    ])
}

async fn check_tesseract(command: &str) -> bool {
    match Command::new(command).arg("--version").output().await {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first = version.lines().next().unwrap_or("").trim();
            note_success(&format!("Found {first}"));
            true
        }
        Ok(output) => {
            note_error(&format!("'{command} --version' exited with {}", output.status));
            false
        }
        Err(e) => {
            note_error(&format!("Cannot run '{command}': {e}. Install tesseract-ocr with the jpn data."));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_show_defaults_and_mask_secrets() {
        let mut config = BotConfig::default();
        config.line.channel_secret = Some("0123456789abcdef".into());
        config.ocr.languages = Some("jpn".into());

        let rows: HashMap<_, _> = settings_rows(&config).unwrap().into_iter().collect();
        assert_eq!(rows["listen"], "0.0.0.0:8000");
        assert_eq!(rows["webhook path"], "/callback");
        assert_eq!(rows["channel secret"], "0123***");
        assert_eq!(rows["access token"], "(unset)");
        assert_eq!(rows["ocr languages"], "jpn");
        assert_eq!(rows["image ack"], "Image received. Processing...");
        assert_eq!(rows["log level"], "info");
    }

    #[tokio::test]
    async fn missing_secrets_fail_the_check() {
        let dir = tempfile::tempdir().unwrap();
        let ok = run(&dir.path().join("none.yaml"), &HashMap::new()).await.unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn missing_tesseract_binary_fails_the_check() {
        let dir = tempfile::tempdir().unwrap();
        let env: HashMap<String, String> = [
            ("LINE_CHANNEL_SECRET", "s"),
            ("LINE_CHANNEL_ACCESS_TOKEN", "t"),
            ("OPENAI_API_KEY", "sk"),
            ("TESSERACT_CMD", "/nonexistent/tesseract-binary"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let ok = run(&dir.path().join("none.yaml"), &env).await.unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn vision_engine_with_secrets_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "ocr:\n  engine: vision\n").unwrap();
        let env: HashMap<String, String> = [
            ("LINE_CHANNEL_SECRET", "s"),
            ("LINE_CHANNEL_ACCESS_TOKEN", "t"),
            ("OPENAI_API_KEY", "sk"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert!(run(&path, &env).await.unwrap());
    }
}
