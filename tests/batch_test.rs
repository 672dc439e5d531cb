//! Batch transcription tests
//!
//! A scripted OCR engine stands in for tesseract; each page image carries a
//! tag byte so the engine can tell pages apart.

use async_trait::async_trait;
use reading_companion::error::{AssistError, Result};
use reading_companion::ocr::{OcrMode, Transcriber};
use reading_companion::transcribe::{run_batch, BatchEvent, StopToken};
use reading_companion_common::{BatchState, CapturedImage, SessionStore};
use std::collections::HashSet;
use std::sync::Mutex;

struct ScriptedOcr {
    calls: Mutex<Vec<u8>>,
    failing: HashSet<u8>,
    /// Request a stop once this many pages have been seen
    stop_after: Option<(usize, StopToken)>,
}

impl ScriptedOcr {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            stop_after: None,
        }
    }

    fn failing(tags: &[u8]) -> Self {
        Self {
            failing: tags.iter().copied().collect(),
            ..Self::new()
        }
    }

    fn stopping_after(count: usize, stop: &StopToken) -> Self {
        Self {
            stop_after: Some((count, stop.clone())),
            ..Self::new()
        }
    }

    fn calls(&self) -> Vec<u8> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for ScriptedOcr {
    async fn transcribe(&self, image: &CapturedImage, mode: OcrMode) -> Result<String> {
        assert_eq!(mode, OcrMode::Page);
        let tag = image.rgba[0];
        let seen = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(tag);
            calls.len()
        };
        if let Some((count, stop)) = &self.stop_after {
            if seen == *count {
                stop.request_stop();
            }
        }
        if self.failing.contains(&tag) {
            return Err(AssistError::Ocr(format!("engine crashed on {}", tag)));
        }
        Ok(format!("text {}", tag))
    }
}

fn page(tag: u8) -> CapturedImage {
    CapturedImage::new(1, 1, vec![tag, 0, 0, 255])
}

fn store_with_pages(count: u8) -> SessionStore {
    let mut store = SessionStore::new();
    for tag in 1..=count {
        store.append_page(page(tag));
    }
    store
}

fn transcripts(store: &SessionStore) -> Vec<Option<String>> {
    store.pages().iter().map(|p| p.transcript.clone()).collect()
}

#[tokio::test]
async fn test_full_run_transcribes_every_page_in_order() {
    let mut store = store_with_pages(3);
    let ocr = ScriptedOcr::new();
    let stop = StopToken::new();

    let jobs = store.pending_pages();
    let outcome = run_batch(jobs, &ocr, &stop, |event| {
        event.apply_to(&mut store);
    })
    .await;

    assert_eq!(outcome.state, BatchState::Completed);
    assert_eq!(outcome.progress.done, 3);
    assert_eq!(outcome.progress.failed, 0);
    assert_eq!(ocr.calls(), vec![1, 2, 3]);
    assert_eq!(store.transcribed_count(), 3);
    assert!(store.book_context().starts_with("[Page 1]\ntext 1"));
}

#[tokio::test]
async fn test_stop_then_resume_skips_finished_pages() {
    let mut store = store_with_pages(5);
    let stop = StopToken::new();
    let ocr = ScriptedOcr::stopping_after(2, &stop);

    let jobs = store.pending_pages();
    let outcome = run_batch(jobs, &ocr, &stop, |event| {
        event.apply_to(&mut store);
    })
    .await;

    // Page 2 was in progress when the stop came in, so it still finishes
    assert_eq!(outcome.state, BatchState::StoppedByUser);
    assert_eq!(outcome.progress.done, 2);
    assert_eq!(outcome.progress.total, 5);
    assert_eq!(
        transcripts(&store),
        vec![Some("text 1".into()), Some("text 2".into()), None, None, None]
    );

    let resume = store.pending_pages();
    assert_eq!(resume.first().map(|job| job.page_number), Some(3));

    let ocr_resume = ScriptedOcr::new();
    let outcome = run_batch(resume, &ocr_resume, &StopToken::new(), |event| {
        event.apply_to(&mut store);
    })
    .await;

    assert_eq!(outcome.state, BatchState::Completed);
    assert_eq!(ocr_resume.calls(), vec![3, 4, 5]);
    assert_eq!(store.transcribed_count(), 5);
}

#[tokio::test]
async fn test_stop_before_start_processes_nothing() {
    let store = store_with_pages(2);
    let stop = StopToken::new();
    stop.request_stop();
    let ocr = ScriptedOcr::new();

    let outcome = run_batch(store.pending_pages(), &ocr, &stop, |_| {}).await;
    assert_eq!(outcome.state, BatchState::StoppedByUser);
    assert_eq!(outcome.progress.done, 0);
    assert!(ocr.calls().is_empty());
}

#[tokio::test]
async fn test_failed_page_is_left_pending_and_run_continues() {
    let mut store = store_with_pages(3);
    let ocr = ScriptedOcr::failing(&[2]);
    let mut failures = Vec::new();

    let jobs = store.pending_pages();
    let outcome = run_batch(jobs, &ocr, &StopToken::new(), |event| {
        if let BatchEvent::PageFailed { page_number, reason, .. } = &event {
            failures.push((*page_number, reason.clone()));
        }
        event.apply_to(&mut store);
    })
    .await;

    assert_eq!(outcome.state, BatchState::Completed);
    assert_eq!(outcome.progress.failed, 1);
    assert_eq!(ocr.calls(), vec![1, 2, 3]);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 2);
    assert!(failures[0].1.contains("page 2"));
    assert_eq!(transcripts(&store)[1], None);

    let retry: Vec<usize> = store.pending_pages().iter().map(|j| j.page_number).collect();
    assert_eq!(retry, vec![2]);
}

#[tokio::test]
async fn test_all_pages_failing_ends_failed() {
    let store = store_with_pages(2);
    let ocr = ScriptedOcr::failing(&[1, 2]);

    let outcome = run_batch(store.pending_pages(), &ocr, &StopToken::new(), |_| {}).await;
    assert_eq!(outcome.state, BatchState::Failed);
    assert_eq!(outcome.progress.failed, 2);
}

#[tokio::test]
async fn test_empty_run_completes() {
    let ocr = ScriptedOcr::new();
    let outcome = run_batch(Vec::new(), &ocr, &StopToken::new(), |_| {}).await;
    assert_eq!(outcome.state, BatchState::Completed);
    assert_eq!(outcome.progress.total, 0);
}

#[tokio::test]
async fn test_result_for_deleted_page_is_discarded() {
    let mut store = store_with_pages(3);
    let ocr = ScriptedOcr::new();

    let mut events = Vec::new();
    run_batch(store.pending_pages(), &ocr, &StopToken::new(), |event| {
        events.push(event);
    })
    .await;

    // The user deletes page 1 before the results are applied
    store.remove_page(1);
    let applied: Vec<bool> = events
        .iter()
        .filter(|e| matches!(e, BatchEvent::PageDone { .. }))
        .map(|e| e.apply_to(&mut store))
        .collect();

    assert_eq!(applied, vec![false, true, true]);
    assert_eq!(
        transcripts(&store),
        vec![Some("text 2".into()), Some("text 3".into())]
    );
}
