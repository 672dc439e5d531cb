//! Batch transcription run state
//!
//! `Idle -> Running -> Completed | StoppedByUser | Failed`. A trigger while
//! running is a stop request, never a second run.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
    StoppedByUser,
    Failed,
}

impl BatchState {
    pub fn is_running(self) -> bool {
        self == BatchState::Running
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Idle => write!(f, "idle"),
            BatchState::Running => write!(f, "running"),
            BatchState::Completed => write!(f, "completed"),
            BatchState::StoppedByUser => write!(f, "stopped"),
            BatchState::Failed => write!(f, "failed"),
        }
    }
}

/// What a trigger (button press) should do in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    Start,
    RequestStop,
}

/// Progress of one run, updated after each finished page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchProgress {
    pub done: usize,
    pub total: usize,
    pub failed: usize,
}

impl BatchProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f32 / self.total as f32
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub state: BatchState,
    pub progress: BatchProgress,
}

/// State holder for the one batch run a controller may have.
#[derive(Debug, Default)]
pub struct BatchControl {
    state: BatchState,
    progress: BatchProgress,
    stop_requested: bool,
}

impl BatchControl {
    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn progress(&self) -> BatchProgress {
        self.progress
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Interpret a trigger. Starting resets progress to `total` pending pages.
    pub fn trigger(&mut self, total: usize) -> TriggerAction {
        if self.state.is_running() {
            self.stop_requested = true;
            TriggerAction::RequestStop
        } else {
            self.state = BatchState::Running;
            self.progress = BatchProgress {
                done: 0,
                total,
                failed: 0,
            };
            self.stop_requested = false;
            TriggerAction::Start
        }
    }

    /// Record one finished page. Ignored when no run is active.
    pub fn page_finished(&mut self, ok: bool) {
        if !self.state.is_running() {
            return;
        }
        self.progress.done += 1;
        if !ok {
            self.progress.failed += 1;
        }
    }

    /// Close the run with its final state.
    pub fn finish(&mut self, outcome: BatchOutcome) {
        if !self.state.is_running() {
            return;
        }
        self.state = outcome.state;
        self.progress = outcome.progress;
        self.stop_requested = false;
    }
}
