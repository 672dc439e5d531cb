use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("LLM API key is not set. Export OPENAI_API_KEY or add llm.api_key to the config file")]
    MissingApiKey,

    #[error("Clipboard does not contain an image")]
    CaptureEmpty,

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("Transcription failed for page {page}: {reason}")]
    TranscriptionFailed { page: usize, reason: String },

    #[error("OCR error: {0}")]
    Ocr(String),

    /// The model could not be reached or its reply did not name an option.
    /// `raw_response` carries whatever text the model did return.
    #[error("Answer unavailable: {reason}")]
    AnswerUnavailable {
        reason: String,
        raw_response: Option<String>,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] reading_companion_common::Error),
}

impl AssistError {
    pub fn answer_unavailable(reason: impl Into<String>, raw_response: Option<String>) -> Self {
        AssistError::AnswerUnavailable {
            reason: reason.into(),
            raw_response,
        }
    }

    /// Raw model text attached to an `AnswerUnavailable` error.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AssistError::AnswerUnavailable { raw_response, .. } => raw_response.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistError>;
