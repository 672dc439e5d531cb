use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Language-model backend used for quiz answers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// OpenAI-compatible `/chat/completions` endpoint
    #[default]
    #[value(name = "openai")]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl AiProvider {
    pub fn name(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Ollama => "ollama",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "https://api.openai.com/v1",
            AiProvider::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o-mini",
            AiProvider::Ollama => "llama3.1",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, AiProvider::OpenAi)
    }
}
