//! Session data types
//!
//! Shared by the CLI and the desktop app:
//! - CapturedImage: raw RGBA pixels taken from the clipboard or a file
//! - PageScreenshot: one book page and its transcript
//! - QuizCapture: the single current quiz image/transcript slot
//! - QuizResult: one answer suggestion, display only

use serde::{Deserialize, Serialize};

/// Raw RGBA8 image as captured from the clipboard or decoded from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub width: usize,
    pub height: usize,
    /// Row-major RGBA, `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

impl CapturedImage {
    pub fn new(width: usize, height: usize, rgba: Vec<u8>) -> Self {
        Self { width, height, rgba }
    }

    /// True when the buffer holds no pixels or its size does not match the dimensions.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.rgba.len() < self.width * self.height * 4
    }

    /// True for empty images and for images whose pixels all share one colour.
    ///
    /// OCR on such an image can only ever yield an empty transcript.
    pub fn is_blank(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut pixels = self.rgba.chunks_exact(4);
        let Some(first) = pixels.next() else {
            return true;
        };
        pixels.all(|px| px == first)
    }
}

/// Stable identity of a page entry, independent of its current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u64);

/// One pasted book page.
#[derive(Debug, Clone)]
pub struct PageScreenshot {
    pub id: PageId,
    pub image: CapturedImage,
    /// `None` until a transcription run has produced text for this page
    pub transcript: Option<String>,
}

impl PageScreenshot {
    pub fn is_transcribed(&self) -> bool {
        self.transcript.is_some()
    }
}

/// Work item handed to a batch transcription run.
#[derive(Debug, Clone)]
pub struct PageJob {
    pub id: PageId,
    /// 1-based page number at the time the run was started
    pub page_number: usize,
    pub image: CapturedImage,
}

/// The current quiz question capture.
#[derive(Debug, Clone, Default)]
pub struct QuizCapture {
    pub image: Option<CapturedImage>,
    pub transcript: Option<String>,
    /// Bumped on every replace/clear so late OCR results for an old image are rejected
    pub generation: u64,
}

impl QuizCapture {
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }
}

/// One answer suggestion. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub question: String,
    pub options: Vec<String>,
    pub chosen_index: usize,
    pub raw_response: String,
}

impl QuizResult {
    pub fn chosen_option(&self) -> Option<&str> {
        self.options.get(self.chosen_index).map(String::as_str)
    }

    /// Letter label of the chosen option (`A`, `B`, ...).
    pub fn chosen_letter(&self) -> char {
        crate::prompts::option_letter(self.chosen_index)
    }

    /// Multi-line block shown to the user after an answer request.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("Q: {}", self.question)];
        for (index, option) in self.options.iter().enumerate() {
            let marker = if index == self.chosen_index { "=>" } else { "  " };
            lines.push(format!(
                "{} {}. {}",
                marker,
                crate::prompts::option_letter(index),
                option
            ));
        }
        lines.push(format!("Model: {}", self.raw_response.trim()));
        lines.join("\n")
    }
}

/// Inclusive Lexile measure range used to pre-fill the platform's book filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexileRange {
    pub min: u32,
    pub max: u32,
}

impl LexileRange {
    pub fn new(min: u32, max: u32) -> crate::Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.min > self.max {
            return Err(crate::Error::Config(format!(
                "lexile min {}L exceeds max {}L",
                self.min, self.max
            )));
        }
        Ok(())
    }
}
