use std::collections::VecDeque;

use reading_companion_common::{BatchControl, QuizResult, SessionStore};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub time: String,
    pub message: String,
}

/// Timestamped messages shown in the log panel, oldest dropped first.
#[derive(Debug, Default)]
pub struct LogBuffer {
    lines: VecDeque<LogLine>,
}

impl LogBuffer {
    pub fn push(&mut self, message: impl Into<String>) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        self.push_at(time, message.into());
    }

    fn push_at(&mut self, time: String, message: String) {
        if self.lines.len() == MAX_LOG_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine { time, message });
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    /// Latest message, shown in the status bar.
    pub fn latest(&self) -> Option<&str> {
        self.lines.back().map(|line| line.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Outcome of the last quiz-answer request.
#[derive(Debug, Clone)]
pub enum QuizOutcome {
    Answered(QuizResult),
    Unavailable {
        message: String,
        raw_response: Option<String>,
    },
}

#[derive(Debug, Default)]
pub struct AppState {
    pub session: SessionStore,
    pub batch: BatchControl,
    pub quiz_outcome: Option<QuizOutcome>,
    pub quiz_ocr_running: bool,
    pub answering: bool,
    pub selected_page: Option<usize>,
    pub log: LogBuffer,
}

impl AppState {
    /// Drop the displayed answer; it belongs to the quiz image it was asked for.
    pub fn forget_quiz(&mut self) {
        self.session.clear_quiz();
        self.quiz_outcome = None;
        self.quiz_ocr_running = false;
    }

    /// Keep the selection on an existing page after removals.
    pub fn clamp_selection(&mut self) {
        let count = self.session.page_count();
        self.selected_page = match self.selected_page {
            Some(_) if count == 0 => None,
            Some(n) => Some(n.min(count)),
            None => None,
        };
    }
}
