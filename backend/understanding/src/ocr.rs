//! Optical Character Recognition (OCR)
//!
//! Runs the `tesseract` CLI against image bytes piped through stdin, so a slow
//! recognition only suspends the calling task.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use relaybot_core::OcrEngine;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

pub const DEFAULT_TESSERACT_COMMAND: &str = "tesseract";

/// Tesseract language hint, e.g. `jpn` or `jpn+eng`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrLanguages(Vec<String>);

impl OcrLanguages {
    /// Parse `jpn+eng`, `jpn,eng` or `jpn eng`.
    pub fn parse(list: &str) -> Result<Self> {
        let langs: Vec<String> = list
            .split(['+', ',', ' '])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if langs.is_empty() {
            bail!("OCR language list is empty");
        }
        if let Some(bad) = langs
            .iter()
            .find(|l| !l.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            bail!("invalid OCR language code: {bad:?}");
        }
        Ok(Self(langs))
    }

    /// The `-l` argument value.
    pub fn as_arg(&self) -> String {
        self.0.join("+")
    }
}

impl Default for OcrLanguages {
    fn default() -> Self {
        Self(vec!["jpn".to_string(), "eng".to_string()])
    }
}

pub struct TesseractOcr {
    command: String,
    languages: OcrLanguages,
    page_seg_mode: Option<u8>,
}

impl TesseractOcr {
    pub fn new(languages: OcrLanguages) -> Self {
        Self {
            command: DEFAULT_TESSERACT_COMMAND.to_string(),
            languages,
            page_seg_mode: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_page_seg_mode(mut self, psm: Option<u8>) -> Self {
        self.page_seg_mode = psm;
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.languages.as_arg(),
        ];
        if let Some(psm) = self.page_seg_mode {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        info!(
            bytes = image.len(),
            languages = %self.languages.as_arg(),
            "Running OCR on image"
        );

        let mut child = Command::new(&self.command)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start `{}`", self.command))?;

        let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
        let write = async move {
            let res = stdin.write_all(image).await;
            drop(stdin);
            res
        };
        let (write_res, output) = tokio::join!(write, child.wait_with_output());
        let output = output.context("failed to wait for tesseract")?;

        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        write_res.context("failed to write image to tesseract")?;

        let text = normalize_text(&String::from_utf8_lossy(&output.stdout));
        debug!(chars = text.chars().count(), "OCR finished");
        Ok(text)
    }
}

/// Trim every line and drop blank ones.
pub fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
