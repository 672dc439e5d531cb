//! Quiz answering through a language model
//!
//! `ChatBackend` is the thin HTTP adapter (OpenAI-compatible or Ollama).
//! `LlmClient` adds the fixed system instruction, the prompt layout and the
//! mapping of the free-text reply back to an option index.

mod ollama;
mod openai;

pub use ollama::OllamaBackend;
pub use openai::{extract_chat_content, OpenAiBackend};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reading_companion_common::{
    build_quiz_prompt, match_answer, parse_quiz_text, trim_context, QuizResult, SYSTEM_PROMPT,
};
use tracing::{info, warn};

use crate::ai_provider::AiProvider;
use crate::config::LlmConfig;
use crate::error::{AssistError, Result};

/// One chat turn: system instruction plus user message in, reply text out.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, system: &str, user: &str) -> Result<String>;
}

/// A non-2xx reply from the model endpoint. The body is diagnostics, not model
/// text, so it goes into the reason.
fn status_error(endpoint: &str, status: reqwest::StatusCode, body: &str) -> AssistError {
    AssistError::answer_unavailable(format!("{} returned {}: {}", endpoint, status, body.trim()), None)
}

/// Index of the chosen option plus the model's raw reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenAnswer {
    pub chosen_index: usize,
    pub raw_response: String,
}

/// The single capability the GUI and CLI depend on.
#[async_trait]
pub trait AnswerChooser: Send + Sync {
    /// Pick one of `options` for `question`, optionally grounded in `context`.
    ///
    /// Fails with `AnswerUnavailable` when the call fails or the reply names no option.
    async fn choose_answer(
        &self,
        question: &str,
        options: &[String],
        context: Option<&str>,
    ) -> Result<ChosenAnswer>;
}

pub struct LlmClient {
    backend: Box<dyn ChatBackend>,
    max_context_chars: usize,
}

impl LlmClient {
    pub fn new(backend: Box<dyn ChatBackend>, max_context_chars: usize) -> Self {
        Self {
            backend,
            max_context_chars,
        }
    }

    /// Build the backend selected in the configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let backend: Box<dyn ChatBackend> = match config.provider {
            AiProvider::OpenAi => Box::new(OpenAiBackend::from_config(config)?),
            AiProvider::Ollama => Box::new(OllamaBackend::from_config(config)?),
        };
        Ok(Self::new(backend, config.max_context_chars))
    }
}

#[async_trait]
impl AnswerChooser for LlmClient {
    async fn choose_answer(
        &self,
        question: &str,
        options: &[String],
        context: Option<&str>,
    ) -> Result<ChosenAnswer> {
        let context = context
            .map(|c| trim_context(c, self.max_context_chars))
            .filter(|c| !c.is_empty());
        let prompt = build_quiz_prompt(question, options, context);

        let start = Instant::now();
        let raw_response = match self.backend.chat(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => text,
            Err(err @ AssistError::AnswerUnavailable { .. }) => return Err(err),
            Err(err) => {
                warn!(backend = self.backend.name(), "LLM call failed: {}", err);
                return Err(AssistError::answer_unavailable(err.to_string(), None));
            }
        };
        info!(
            backend = self.backend.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "LLM replied"
        );

        match match_answer(&raw_response, options) {
            Some(chosen_index) => Ok(ChosenAnswer {
                chosen_index,
                raw_response,
            }),
            None => Err(AssistError::answer_unavailable(
                "reply does not match any option",
                Some(raw_response),
            )),
        }
    }
}

/// Build the chooser for the configured provider.
pub fn create_chooser(config: &LlmConfig) -> Result<Arc<dyn AnswerChooser>> {
    Ok(Arc::new(LlmClient::from_config(config)?))
}

/// Parse a quiz transcript and ask `chooser` for an answer.
///
/// `book_context` may be empty: the question is then asked without context.
pub async fn answer_quiz(
    chooser: &dyn AnswerChooser,
    quiz_transcript: &str,
    book_context: &str,
) -> Result<QuizResult> {
    let parsed = parse_quiz_text(quiz_transcript);
    parsed.ensure_answerable()?;

    let context = Some(book_context).filter(|c| !c.trim().is_empty());
    let answer = chooser
        .choose_answer(&parsed.question, &parsed.options, context)
        .await?;

    Ok(QuizResult {
        question: parsed.question,
        options: parsed.options,
        chosen_index: answer.chosen_index,
        raw_response: answer.raw_response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend returning a canned reply and recording the prompt it saw.
    struct ScriptedBackend {
        reply: Option<String>,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedBackend {
        fn replying(text: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let backend = Self {
                reply: Some(text.to_string()),
                seen: seen.clone(),
            };
            (backend, seen)
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, system: &str, user: &str) -> Result<String> {
            assert_eq!(system, SYSTEM_PROMPT);
            self.seen.lock().unwrap().push(user.to_string());
            self.reply.clone().ok_or_else(|| {
                AssistError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))
            })
        }
    }

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_choose_answer_matches_letter() {
        let (backend, _) = ScriptedBackend::replying("B. 4");
        let client = LlmClient::new(Box::new(backend), 4000);
        let answer = client
            .choose_answer("What is 2+2?", &opts(&["3", "4", "5"]), None)
            .await
            .unwrap();
        assert_eq!(answer.chosen_index, 1);
        assert_eq!(answer.raw_response, "B. 4");
    }

    #[tokio::test]
    async fn test_unmatched_reply_keeps_raw_text() {
        let (backend, _) = ScriptedBackend::replying("None of these are right.");
        let client = LlmClient::new(Box::new(backend), 4000);
        let err = client
            .choose_answer("What is 2+2?", &opts(&["3", "4", "5"]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::AnswerUnavailable { .. }));
        assert_eq!(err.raw_response(), Some("None of these are right."));
    }

    #[tokio::test]
    async fn test_backend_failure_is_answer_unavailable() {
        let client = LlmClient::new(Box::new(ScriptedBackend::failing()), 4000);
        let err = client
            .choose_answer("Q?", &opts(&["a", "b"]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::AnswerUnavailable { .. }));
        assert_eq!(err.raw_response(), None);
    }

    #[test]
    fn test_status_error_has_no_model_text() {
        let err = status_error(
            "LLM endpoint",
            reqwest::StatusCode::UNAUTHORIZED,
            "{\"error\": \"invalid api key\"}\n",
        );
        assert_eq!(err.raw_response(), None);
        assert_eq!(
            err.to_string(),
            "Answer unavailable: LLM endpoint returned 401 Unauthorized: {\"error\": \"invalid api key\"}"
        );
    }

    #[tokio::test]
    async fn test_context_is_trimmed_to_budget() {
        let (backend, seen) = ScriptedBackend::replying("A");
        let client = LlmClient::new(Box::new(backend), 10);
        let context = format!("{}TAIL-12345", "x".repeat(50));
        client
            .choose_answer("Q?", &opts(&["a", "b"]), Some(&context))
            .await
            .unwrap();
        let prompt = seen.lock().unwrap()[0].clone();
        assert!(prompt.contains("Book transcript:\nTAIL-12345\n"));
        assert!(!prompt.contains("xTAIL"));
    }

    #[tokio::test]
    async fn test_answer_quiz_from_transcript() {
        let (backend, seen) = ScriptedBackend::replying("C. 5");
        let client = LlmClient::new(Box::new(backend), 4000);
        let result = answer_quiz(&client, "What is 2+2?\nA. 3\nB. 4\nC. 5", "")
            .await
            .unwrap();
        assert_eq!(result.question, "What is 2+2?");
        assert_eq!(result.options, opts(&["3", "4", "5"]));
        assert_eq!(result.chosen_index, 2);
        assert!(!seen.lock().unwrap()[0].contains("Book transcript"));
    }

    #[tokio::test]
    async fn test_answer_quiz_rejects_unparseable_text() {
        let (backend, seen) = ScriptedBackend::replying("A");
        let client = LlmClient::new(Box::new(backend), 4000);
        let err = answer_quiz(&client, "Just a heading", "").await.unwrap_err();
        assert!(matches!(err, AssistError::Common(_)));
        assert!(seen.lock().unwrap().is_empty());
    }
}
