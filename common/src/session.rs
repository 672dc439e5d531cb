//! Screenshot session store
//!
//! Pages accumulate, the quiz slot is replaced. Page numbers are positions
//! (1-based) and stay dense after every removal; `PageId` is the stable key
//! used to route OCR results back to an entry.

use crate::types::{CapturedImage, PageId, PageJob, PageScreenshot, QuizCapture};

/// In-memory session: ordered book pages plus the current quiz capture.
#[derive(Debug, Default)]
pub struct SessionStore {
    pages: Vec<PageScreenshot>,
    quiz: QuizCapture,
    next_id: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =============================================
    // Pages
    // =============================================

    /// Append a page image and return its 1-based page number.
    pub fn append_page(&mut self, image: CapturedImage) -> usize {
        let id = PageId(self.next_id);
        self.next_id += 1;
        self.pages.push(PageScreenshot {
            id,
            image,
            transcript: None,
        });
        self.pages.len()
    }

    /// Remove a page by number. Later pages shift down by one.
    ///
    /// Returns the removed entry, or `None` for an out-of-range number.
    pub fn remove_page(&mut self, page_number: usize) -> Option<PageScreenshot> {
        if page_number == 0 || page_number > self.pages.len() {
            return None;
        }
        Some(self.pages.remove(page_number - 1))
    }

    pub fn clear_pages(&mut self) {
        self.pages.clear();
    }

    pub fn pages(&self) -> &[PageScreenshot] {
        &self.pages
    }

    pub fn page(&self, page_number: usize) -> Option<&PageScreenshot> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Current page number of an entry, if it still exists.
    pub fn page_number_of(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id).map(|i| i + 1)
    }

    pub fn transcribed_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_transcribed()).count()
    }

    /// Store a transcript for a page. Returns `false` if the page was removed meanwhile.
    pub fn set_page_transcript(&mut self, id: PageId, text: String) -> bool {
        match self.pages.iter_mut().find(|p| p.id == id) {
            Some(page) => {
                page.transcript = Some(text);
                true
            }
            None => false,
        }
    }

    /// Jobs for pages that have no transcript yet, in page order.
    pub fn pending_pages(&self) -> Vec<PageJob> {
        self.jobs(|page| !page.is_transcribed())
    }

    /// Jobs for every page, in page order. Used for a full re-transcription.
    pub fn all_pages(&self) -> Vec<PageJob> {
        self.jobs(|_| true)
    }

    fn jobs(&self, include: impl Fn(&PageScreenshot) -> bool) -> Vec<PageJob> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| include(page))
            .map(|(index, page)| PageJob {
                id: page.id,
                page_number: index + 1,
                image: page.image.clone(),
            })
            .collect()
    }

    /// Book transcripts joined in page order, each labelled with its page number.
    ///
    /// Pages without text are skipped. Empty when nothing has been transcribed.
    pub fn book_context(&self) -> String {
        self.pages
            .iter()
            .enumerate()
            .filter_map(|(index, page)| {
                let text = page.transcript.as_deref()?.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(format!("[Page {}]\n{}", index + 1, text))
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    // =============================================
    // Quiz slot
    // =============================================

    /// Replace the quiz capture. Any previous transcript is dropped.
    ///
    /// Returns the new generation; pass it back to `set_quiz_transcript`.
    pub fn set_quiz(&mut self, image: CapturedImage) -> u64 {
        let generation = self.quiz.generation + 1;
        self.quiz = QuizCapture {
            image: Some(image),
            transcript: None,
            generation,
        };
        generation
    }

    pub fn clear_quiz(&mut self) {
        let generation = self.quiz.generation + 1;
        self.quiz = QuizCapture {
            image: None,
            transcript: None,
            generation,
        };
    }

    pub fn quiz(&self) -> &QuizCapture {
        &self.quiz
    }

    /// Store the quiz transcript if it belongs to the image currently held.
    ///
    /// Results for a replaced or cleared image are rejected (`false`).
    pub fn set_quiz_transcript(&mut self, generation: u64, text: String) -> bool {
        if self.quiz.image.is_none() || self.quiz.generation != generation {
            return false;
        }
        self.quiz.transcript = Some(text);
        true
    }

    /// Drop all pages and the quiz capture.
    pub fn reset(&mut self) {
        self.clear_pages();
        self.clear_quiz();
    }
}
