//! Batch transcription over page screenshots
//!
//! Pages are processed in ascending page order. A stop request is honoured
//! at page boundaries only: the page in progress finishes, the next one is
//! never started. A failed page is reported and left without a transcript,
//! so a later run picks it up again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reading_companion_common::{
    BatchOutcome, BatchProgress, BatchState, PageId, PageJob, SessionStore,
};
use tracing::{info, warn};

use crate::error::AssistError;
use crate::ocr::{OcrMode, Transcriber};

/// Cooperative cancellation flag shared between the controller and a run.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-page notifications emitted by `run_batch`.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    PageStarted {
        id: PageId,
        page_number: usize,
    },
    PageDone {
        id: PageId,
        page_number: usize,
        text: String,
        progress: BatchProgress,
    },
    PageFailed {
        id: PageId,
        page_number: usize,
        reason: String,
        progress: BatchProgress,
    },
}

impl BatchEvent {
    /// Write the event's result into the session.
    ///
    /// Returns `false` when the page no longer exists (deleted during the run)
    /// or when the event carries no transcript.
    pub fn apply_to(&self, store: &mut SessionStore) -> bool {
        match self {
            BatchEvent::PageDone { id, text, .. } => store.set_page_transcript(*id, text.clone()),
            BatchEvent::PageStarted { .. } | BatchEvent::PageFailed { .. } => false,
        }
    }
}

/// Transcribe `jobs` in order, calling `on_event` after each state change.
pub async fn run_batch<F>(
    jobs: Vec<PageJob>,
    ocr: &dyn Transcriber,
    stop: &StopToken,
    mut on_event: F,
) -> BatchOutcome
where
    F: FnMut(BatchEvent),
{
    let mut progress = BatchProgress {
        done: 0,
        total: jobs.len(),
        failed: 0,
    };
    info!(pages = progress.total, "batch transcription started");

    for job in jobs {
        if stop.is_stop_requested() {
            info!(done = progress.done, total = progress.total, "batch transcription stopped by user");
            return BatchOutcome {
                state: BatchState::StoppedByUser,
                progress,
            };
        }

        on_event(BatchEvent::PageStarted {
            id: job.id,
            page_number: job.page_number,
        });

        match ocr.transcribe(&job.image, OcrMode::Page).await {
            Ok(text) => {
                progress.done += 1;
                info!(page = job.page_number, chars = text.len(), "page transcribed");
                on_event(BatchEvent::PageDone {
                    id: job.id,
                    page_number: job.page_number,
                    text,
                    progress,
                });
            }
            Err(err) => {
                progress.done += 1;
                progress.failed += 1;
                let err = AssistError::TranscriptionFailed {
                    page: job.page_number,
                    reason: err.to_string(),
                };
                warn!("{}", err);
                on_event(BatchEvent::PageFailed {
                    id: job.id,
                    page_number: job.page_number,
                    reason: err.to_string(),
                    progress,
                });
            }
        }
    }

    let state = if progress.total > 0 && progress.failed == progress.total {
        BatchState::Failed
    } else {
        BatchState::Completed
    };
    info!(done = progress.done, failed = progress.failed, %state, "batch transcription finished");
    BatchOutcome { state, progress }
}
