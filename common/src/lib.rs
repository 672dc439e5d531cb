//! Reading Companion Common Library
//!
//! Pure session and quiz logic shared by the CLI and the desktop app

pub mod batch;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod prompts;
pub mod session;
pub mod types;

pub use batch::{BatchControl, BatchOutcome, BatchProgress, BatchState, TriggerAction};
pub use error::{Error, Result};
pub use matcher::match_answer;
pub use parser::{parse_quiz_text, ParsedQuiz};
pub use prompts::{build_quiz_prompt, option_letter, trim_context, DEFAULT_MAX_CONTEXT_CHARS, SYSTEM_PROMPT};
pub use session::SessionStore;
pub use types::{CapturedImage, LexileRange, PageId, PageJob, PageScreenshot, QuizCapture, QuizResult};
