//! `relaybot-config` — relaybot runtime configuration.
//!
//! Provides:
//! - Typed config schema with defaults
//! - YAML loading with `${ENV_VAR}` substitution
//! - Overrides from well-known environment variables
//! - Validation with all problems reported at once
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, process_env, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, load_config_value};
pub use redact::redact;
pub use schema::{BotConfig, Secrets};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Env var naming the config file itself.
pub const ENV_CONFIG_FILE: &str = "RELAYBOT_CONFIG";

/// The config file to read.
/// Priority: explicit path > `RELAYBOT_CONFIG` env > `<config_dir>/config.yaml`
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(ENV_CONFIG_FILE) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => config_file_path(&config_dir()),
    }
}

/// A validated config plus the warnings found while validating it.
///
/// Warnings are handed back rather than logged because the logger is built
/// from the config and does not exist yet.
#[derive(Debug)]
pub struct PreparedConfig {
    pub config: BotConfig,
    pub warnings: Vec<ConfigValidationError>,
}

/// Load, substitute env references, apply env overrides and validate.
///
/// This is the main entry point for loading a config at runtime. Every
/// validation error is included in the returned error, one per line.
pub async fn load_and_prepare(
    path: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<PreparedConfig> {
    let path = resolve_config_path(path);
    let value = load_config_value(&path).await?;

    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;

    let config: BotConfig = serde_json::from_value(value)
        .with_context(|| format!("Invalid config structure in: {}", path.display()))?;

    let config = apply_env_overrides(config, env)?;

    let report = validate(&config);
    if !report.is_valid() {
        let messages: Vec<_> = report.errors.iter().map(|e| e.message.as_str()).collect();
        bail!(messages.join("\n"));
    }

    Ok(PreparedConfig {
        config,
        warnings: report.warnings,
    })
}
