//! OCR transcription
//!
//! Local OCR through the `tesseract` command-line program. The image is
//! written to a temporary PNG and the recognised text is read from stdout.

use async_trait::async_trait;
use reading_companion_common::CapturedImage;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::capture::encode_png;
use crate::config::OcrConfig;
use crate::error::{AssistError, Result};

/// Layout assumption passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Full book page: automatic page segmentation
    Page,
    /// Cropped quiz region: a single uniform block of text
    Quiz,
}

impl OcrMode {
    fn page_segmentation(self) -> &'static str {
        match self {
            OcrMode::Page => "3",
            OcrMode::Quiz => "6",
        }
    }
}

/// Image in, text out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Recognise the text in `image`. Blank images yield an empty string.
    async fn transcribe(&self, image: &CapturedImage, mode: OcrMode) -> Result<String>;
}

pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.command.clone(), config.language.clone())
    }

    /// Check that the executable can be started.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Transcriber for TesseractOcr {
    async fn transcribe(&self, image: &CapturedImage, mode: OcrMode) -> Result<String> {
        if image.is_blank() {
            debug!("blank image, skipping OCR");
            return Ok(String::new());
        }

        let png = encode_png(image)?;
        let input = tempfile::Builder::new()
            .prefix("ocr_input_")
            .suffix(".png")
            .tempfile()?;
        tokio::fs::write(input.path(), &png).await?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--oem", "3"])
            .args(["--psm", mode.page_segmentation()])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AssistError::Ocr(format!("failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssistError::Ocr(format!(
                "{} exited with {:?}: {}",
                self.command,
                output.status.code(),
                stderr.trim()
            )));
        }

        let text = clean_ocr_text(&String::from_utf8_lossy(&output.stdout));
        debug!(chars = text.len(), ?mode, "OCR finished");
        Ok(text)
    }
}

/// Normalise engine output: drop form feeds and trailing spaces, collapse runs of blank lines.
pub fn clean_ocr_text(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = true;
    for line in raw.lines() {
        let line = line.trim_end_matches(|c: char| c.is_whitespace() || c == '\u{c}');
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }
    lines.join("\n").trim().to_string()
}
