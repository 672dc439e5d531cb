use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use eframe::egui::{self, Color32, RichText};
use eframe::egui::{FontData, FontDefinitions, FontFamily};
use tokio::runtime::Runtime;
use tokio::sync::Mutex;
use tracing::{info, warn};

use reading_companion::browser::BrowserSession;
use reading_companion::capture;
use reading_companion::config::Config;
use reading_companion::error::{AssistError, Result as AssistResult};
use reading_companion::llm;
use reading_companion::ocr::{OcrMode, TesseractOcr, Transcriber};
use reading_companion::transcribe::{self, BatchEvent, StopToken};
use reading_companion_common::{
    BatchOutcome, BatchState, CapturedImage, LexileRange, PageId, QuizResult, TriggerAction,
};

use crate::io::{load_image, pick_image_file, thumbnail};
use crate::model::{AppState, QuizOutcome};

type SharedBrowser = Arc<Mutex<Option<BrowserSession>>>;

const BUSY_REPAINT: Duration = Duration::from_millis(100);

pub struct DesktopApp {
    state: AppState,
    config: Config,
    runtime: Runtime,
    ocr: Arc<TesseractOcr>,
    browser: SharedBrowser,
    browser_open: bool,
    browser_busy: bool,
    lexile_min: u32,
    lexile_max: u32,
    stop_token: Option<StopToken>,
    batch_page: Option<usize>,
    tx: Sender<UiMessage>,
    rx: Receiver<UiMessage>,
    thumbs: HashMap<PageId, egui::TextureHandle>,
    thumb_rx: Receiver<ThumbData>,
    thumb_tx: Sender<ThumbData>,
    thumb_inflight: HashSet<PageId>,
    pending_thumbs: Vec<ThumbData>,
    quiz_texture: Option<egui::TextureHandle>,
}

enum UiMessage {
    BrowserDone {
        action: &'static str,
        result: Result<String, String>,
        open: bool,
    },
    Batch(BatchEvent),
    BatchFinished(BatchOutcome),
    QuizTranscribed {
        generation: u64,
        result: Result<String, String>,
    },
    Answered {
        generation: u64,
        result: AssistResult<QuizResult>,
    },
}

struct ThumbData {
    id: PageId,
    size: [usize; 2],
    pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrowserAction {
    Launch,
    FillLogin,
    ConfirmLogin,
    FillLexile(LexileRange),
    Close,
}

impl BrowserAction {
    fn label(self) -> &'static str {
        match self {
            BrowserAction::Launch => "Launch browser",
            BrowserAction::FillLogin => "Fill login",
            BrowserAction::ConfirmLogin => "Confirm login",
            BrowserAction::FillLexile(_) => "Fill Lexile",
            BrowserAction::Close => "Close browser",
        }
    }
}

async fn perform_browser_action(
    slot: &mut Option<BrowserSession>,
    action: BrowserAction,
    config: &Config,
) -> AssistResult<String> {
    match action {
        BrowserAction::Launch => {
            if slot.is_some() {
                return Ok("Browser is already open".to_string());
            }
            *slot = Some(BrowserSession::launch(config).await?);
            Ok(format!("Browser opened at {}", config.reader.base_url))
        }
        BrowserAction::Close => match slot.take() {
            Some(session) => {
                session.quit().await?;
                Ok("Browser closed".to_string())
            }
            None => Ok("Browser is not open".to_string()),
        },
        BrowserAction::FillLogin => {
            open_session(slot)?.fill_login_form().await?;
            Ok("Login form filled. Check it and press the login button yourself".to_string())
        }
        BrowserAction::ConfirmLogin => {
            let url = open_session(slot)?.confirm_logged_in().await?;
            Ok(format!("Login confirmed at {}", url))
        }
        BrowserAction::FillLexile(range) => {
            open_session(slot)?.fill_lexile_filter(range).await?;
            Ok(format!("Lexile filter set to {}L-{}L", range.min, range.max))
        }
    }
}

fn open_session(slot: &mut Option<BrowserSession>) -> AssistResult<&mut BrowserSession> {
    slot.as_mut()
        .ok_or_else(|| AssistError::Browser("launch the browser first".into()))
}

impl DesktopApp {
    pub fn new(config: Config, runtime: Runtime, config_error: Option<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        let (thumb_tx, thumb_rx) = mpsc::channel();
        let lexile = config.lexile.unwrap_or(LexileRange { min: 400, max: 800 });
        let mut app = Self {
            state: AppState::default(),
            ocr: Arc::new(TesseractOcr::from_config(&config.ocr)),
            config,
            runtime,
            browser: Arc::new(Mutex::new(None)),
            browser_open: false,
            browser_busy: false,
            lexile_min: lexile.min,
            lexile_max: lexile.max,
            stop_token: None,
            batch_page: None,
            tx,
            rx,
            thumbs: HashMap::new(),
            thumb_rx,
            thumb_tx,
            thumb_inflight: HashSet::new(),
            pending_thumbs: Vec::new(),
            quiz_texture: None,
        };
        match config_error {
            Some(err) => app.log(format!("Settings not loaded, using defaults: {err}")),
            None => app.log("Ready. Open the browser, log in, then paste page screenshots"),
        }
        app
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.state.log.push(message);
    }

    fn is_busy(&self) -> bool {
        self.state.batch.state().is_running()
            || self.state.quiz_ocr_running
            || self.state.answering
            || self.browser_busy
            || !self.thumb_inflight.is_empty()
            || !self.pending_thumbs.is_empty()
    }

    // =============================================
    // Browser
    // =============================================

    fn run_browser_action(&mut self, action: BrowserAction) {
        if self.browser_busy {
            self.log("A browser action is still running");
            return;
        }
        self.browser_busy = true;
        let browser = self.browser.clone();
        let config = self.config.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let mut slot = browser.lock().await;
            let result = perform_browser_action(&mut slot, action, &config)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(UiMessage::BrowserDone {
                action: action.label(),
                result,
                open: slot.is_some(),
            });
        });
    }

    fn fill_lexile(&mut self) {
        match LexileRange::new(self.lexile_min, self.lexile_max) {
            Ok(range) => self.run_browser_action(BrowserAction::FillLexile(range)),
            Err(err) => self.log(format!("Fill Lexile: {err}")),
        }
    }

    // =============================================
    // Pages
    // =============================================

    fn paste_page(&mut self) {
        match capture::read_clipboard_image() {
            Ok(image) => self.add_page(image, "clipboard"),
            Err(AssistError::CaptureEmpty) => {
                self.log("Clipboard has no image. Copy a page screenshot first")
            }
            Err(err) => self.log(format!("Paste page failed: {err}")),
        }
    }

    fn load_page_file(&mut self) {
        let Some(path) = pick_image_file() else {
            return;
        };
        match load_image(&path) {
            Ok(image) => {
                let source = path.display().to_string();
                self.add_page(image, &source);
            }
            Err(err) => self.log(format!("Load page failed: {err:#}")),
        }
    }

    fn add_page(&mut self, image: CapturedImage, source: &str) {
        let number = self.state.session.append_page(image);
        let added = self
            .state
            .session
            .page(number)
            .map(|page| (page.id, page.image.clone()));
        if let Some((id, image)) = added {
            self.request_thumbnail(id, image);
        }
        self.state.selected_page = Some(number);
        self.log(format!("Page {number} added from {source}"));
    }

    fn delete_selected_page(&mut self) {
        let Some(number) = self.state.selected_page else {
            self.log("Select a page to delete");
            return;
        };
        if let Some(removed) = self.state.session.remove_page(number) {
            self.thumbs.remove(&removed.id);
            self.state.clamp_selection();
            self.log(format!(
                "Page {number} deleted, {} page(s) left",
                self.state.session.page_count()
            ));
        }
    }

    fn clear_pages(&mut self) {
        self.state.session.clear_pages();
        self.thumbs.clear();
        self.state.clamp_selection();
        self.log("All pages cleared");
    }

    fn request_thumbnail(&mut self, id: PageId, image: CapturedImage) {
        if self.thumbs.contains_key(&id) || !self.thumb_inflight.insert(id) {
            return;
        }
        let sender = self.thumb_tx.clone();
        std::thread::spawn(move || {
            let (size, pixels) = thumbnail(&image).unwrap_or(([0, 0], Vec::new()));
            let _ = sender.send(ThumbData { id, size, pixels });
        });
    }

    fn process_pending_thumbs(&mut self, ctx: &egui::Context) {
        let pending = std::mem::take(&mut self.pending_thumbs);
        for msg in pending {
            if msg.size[0] == 0 || msg.size[1] == 0 {
                continue;
            }
            // Page deleted while its thumbnail was being built
            if self.state.session.page_number_of(msg.id).is_none() {
                continue;
            }
            let color_image = egui::ColorImage::from_rgba_unmultiplied(msg.size, &msg.pixels);
            let texture = ctx.load_texture(
                format!("page-{}", msg.id.0),
                color_image,
                egui::TextureOptions::default(),
            );
            self.thumbs.insert(msg.id, texture);
        }
    }

    // =============================================
    // Batch transcription
    // =============================================

    /// Start a run over untranscribed pages, or ask the running one to stop.
    fn toggle_transcription(&mut self) {
        if self.state.batch.state().is_running() {
            if self.state.batch.trigger(0) == TriggerAction::RequestStop {
                if let Some(stop) = &self.stop_token {
                    stop.request_stop();
                }
                self.log("Stop requested. The current page will finish first");
            }
            return;
        }

        let jobs = self.state.session.pending_pages();
        if jobs.is_empty() {
            self.log("No pages waiting for transcription");
            return;
        }
        if self.state.batch.trigger(jobs.len()) != TriggerAction::Start {
            return;
        }

        let stop = StopToken::new();
        self.stop_token = Some(stop.clone());
        self.log(format!("Transcribing {} page(s)", jobs.len()));

        let ocr = self.ocr.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let events = tx.clone();
            let outcome = transcribe::run_batch(jobs, ocr.as_ref(), &stop, move |event| {
                let _ = events.send(UiMessage::Batch(event));
            })
            .await;
            let _ = tx.send(UiMessage::BatchFinished(outcome));
        });
    }

    fn on_batch_event(&mut self, event: BatchEvent) {
        match &event {
            BatchEvent::PageStarted { page_number, .. } => {
                self.batch_page = Some(*page_number);
            }
            BatchEvent::PageDone { page_number, .. } => {
                self.state.batch.page_finished(true);
                if !event.apply_to(&mut self.state.session) {
                    self.log(format!(
                        "Page {page_number} was deleted during transcription; result discarded"
                    ));
                }
            }
            BatchEvent::PageFailed { reason, .. } => {
                self.state.batch.page_finished(false);
                self.log(reason.clone());
            }
        }
    }

    fn on_batch_finished(&mut self, outcome: BatchOutcome) {
        self.state.batch.finish(outcome);
        self.stop_token = None;
        self.batch_page = None;
        let progress = outcome.progress;
        let summary = match outcome.state {
            BatchState::StoppedByUser => format!(
                "Transcription stopped after {} of {} page(s)",
                progress.done, progress.total
            ),
            BatchState::Failed => format!("Transcription failed on all {} page(s)", progress.total),
            _ => format!(
                "Transcription finished: {} page(s), {} failed",
                progress.done, progress.failed
            ),
        };
        self.log(summary);
    }

    // =============================================
    // Quiz
    // =============================================

    fn paste_quiz(&mut self, ctx: &egui::Context) {
        let image = match capture::read_clipboard_image() {
            Ok(image) => image,
            Err(AssistError::CaptureEmpty) => {
                self.log("Clipboard has no image. Copy the quiz question first");
                return;
            }
            Err(err) => {
                self.log(format!("Paste quiz failed: {err}"));
                return;
            }
        };

        self.state.quiz_outcome = None;
        let generation = self.state.session.set_quiz(image.clone());
        self.quiz_texture = thumbnail(&image).map(|(size, pixels)| {
            ctx.load_texture(
                format!("quiz-{generation}"),
                egui::ColorImage::from_rgba_unmultiplied(size, &pixels),
                egui::TextureOptions::default(),
            )
        });
        self.state.quiz_ocr_running = true;
        self.log("Quiz image pasted, reading its text");

        let ocr = self.ocr.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = ocr
                .transcribe(&image, OcrMode::Quiz)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(UiMessage::QuizTranscribed { generation, result });
        });
    }

    fn on_quiz_transcribed(&mut self, generation: u64, result: Result<String, String>) {
        if generation != self.state.session.quiz().generation {
            return;
        }
        self.state.quiz_ocr_running = false;
        match result {
            Ok(text) if text.trim().is_empty() => {
                self.log("No text found in the quiz image");
                self.state.session.set_quiz_transcript(generation, text);
            }
            Ok(text) => {
                self.state.session.set_quiz_transcript(generation, text);
                self.log("Quiz text ready");
            }
            Err(err) => self.log(format!("Quiz OCR failed: {err}")),
        }
    }

    fn answer_quiz(&mut self) {
        if self.state.answering {
            return;
        }
        let quiz = self.state.session.quiz();
        let generation = quiz.generation;
        let Some(transcript) = quiz.transcript.clone() else {
            let hint = if quiz.is_empty() {
                "Paste a quiz screenshot first"
            } else {
                "Quiz text is not ready yet"
            };
            self.log(hint);
            return;
        };

        let chooser = match llm::create_chooser(&self.config.llm) {
            Ok(chooser) => chooser,
            Err(err) => {
                self.log(format!("Answer unavailable: {err}"));
                self.state.quiz_outcome = Some(QuizOutcome::Unavailable {
                    message: err.to_string(),
                    raw_response: None,
                });
                return;
            }
        };

        let context = self.state.session.book_context();
        if context.is_empty() {
            self.log("No transcribed pages; asking without book context");
        }
        self.state.answering = true;
        self.state.quiz_outcome = None;

        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = llm::answer_quiz(chooser.as_ref(), &transcript, &context).await;
            let _ = tx.send(UiMessage::Answered { generation, result });
        });
    }

    fn on_answered(&mut self, generation: u64, result: AssistResult<QuizResult>) {
        self.state.answering = false;
        if generation != self.state.session.quiz().generation {
            self.log("Discarded an answer for a quiz image that was replaced");
            return;
        }
        match result {
            Ok(answer) => {
                self.log(format!(
                    "Suggested answer: {}. {}",
                    answer.chosen_letter(),
                    answer.chosen_option().unwrap_or_default()
                ));
                self.state.quiz_outcome = Some(QuizOutcome::Answered(answer));
            }
            Err(err) => {
                warn!("{}", err);
                self.log(err.to_string());
                self.state.quiz_outcome = Some(QuizOutcome::Unavailable {
                    message: err.to_string(),
                    raw_response: err.raw_response().map(str::to_string),
                });
            }
        }
    }

    fn reset_quiz(&mut self) {
        self.state.forget_quiz();
        self.quiz_texture = None;
        self.log("Quiz cleared");
    }

    fn exit(&mut self, ctx: &egui::Context) {
        if let Some(stop) = &self.stop_token {
            stop.request_stop();
        }
        let browser = self.browser.clone();
        let closed = self.runtime.block_on(async move {
            tokio::time::timeout(Duration::from_secs(5), async move {
                match browser.lock().await.take() {
                    Some(session) => session.quit().await,
                    None => Ok(()),
                }
            })
            .await
        });
        match closed {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("closing the browser failed: {}", err),
            Err(_) => warn!("browser did not close in time"),
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn poll_messages(&mut self) {
        while let Ok(msg) = self.thumb_rx.try_recv() {
            self.thumb_inflight.remove(&msg.id);
            self.pending_thumbs.push(msg);
        }

        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                UiMessage::BrowserDone {
                    action,
                    result,
                    open,
                } => {
                    self.browser_busy = false;
                    self.browser_open = open;
                    match result {
                        Ok(message) => self.log(message),
                        Err(err) => self.log(format!("{action} failed: {err}")),
                    }
                }
                UiMessage::Batch(event) => self.on_batch_event(event),
                UiMessage::BatchFinished(outcome) => self.on_batch_finished(outcome),
                UiMessage::QuizTranscribed { generation, result } => {
                    self.on_quiz_transcribed(generation, result)
                }
                UiMessage::Answered { generation, result } => self.on_answered(generation, result),
            }
        }
    }

    // =============================================
    // Rendering
    // =============================================

    fn render_toolbar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Browser").strong());
            let idle = !self.browser_busy;
            if ui
                .add_enabled(idle && !self.browser_open, egui::Button::new("Launch"))
                .clicked()
            {
                self.run_browser_action(BrowserAction::Launch);
            }
            if ui
                .add_enabled(idle && self.browser_open, egui::Button::new("Fill login"))
                .clicked()
            {
                self.run_browser_action(BrowserAction::FillLogin);
            }
            if ui
                .add_enabled(idle && self.browser_open, egui::Button::new("Confirm login"))
                .clicked()
            {
                self.run_browser_action(BrowserAction::ConfirmLogin);
            }
            ui.separator();
            ui.label("Lexile");
            ui.add(egui::DragValue::new(&mut self.lexile_min).clamp_range(0..=2000).suffix("L"));
            ui.label("to");
            ui.add(egui::DragValue::new(&mut self.lexile_max).clamp_range(0..=2000).suffix("L"));
            if ui
                .add_enabled(idle && self.browser_open, egui::Button::new("Fill Lexile"))
                .clicked()
            {
                self.fill_lexile();
            }
            ui.separator();
            if ui
                .add_enabled(idle && self.browser_open, egui::Button::new("Close browser"))
                .clicked()
            {
                self.run_browser_action(BrowserAction::Close);
            }
        });

        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Pages").strong());
            if ui.button("Paste page").clicked() {
                self.paste_page();
            }
            if ui.button("Load page file").clicked() {
                self.load_page_file();
            }
            let has_selection = self.state.selected_page.is_some();
            if ui
                .add_enabled(has_selection, egui::Button::new("Delete page"))
                .clicked()
            {
                self.delete_selected_page();
            }
            let has_pages = self.state.session.page_count() > 0;
            if ui
                .add_enabled(has_pages, egui::Button::new("Clear pages"))
                .clicked()
            {
                self.clear_pages();
            }
            ui.separator();
            let running = self.state.batch.state().is_running();
            let label = if running { "Stop" } else { "Transcribe" };
            let enabled = !(running && self.state.batch.stop_requested());
            if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                self.toggle_transcription();
            }
            let progress = self.state.batch.progress();
            if running || progress.total > 0 {
                let text = match self.batch_page {
                    Some(page) if running => format!("page {page} ({}/{})", progress.done, progress.total),
                    _ => format!("{} {}/{}", self.state.batch.state(), progress.done, progress.total),
                };
                ui.add(
                    egui::ProgressBar::new(progress.fraction())
                        .desired_width(220.0)
                        .text(text),
                );
            }
        });

        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Quiz").strong());
            if ui.button("Paste quiz").clicked() {
                self.paste_quiz(ctx);
            }
            let ready = self.state.session.quiz().transcript.is_some();
            if ui
                .add_enabled(ready && !self.state.answering, egui::Button::new("Answer quiz"))
                .clicked()
            {
                self.answer_quiz();
            }
            if ui.button("Reset quiz").clicked() {
                self.reset_quiz();
            }
            ui.separator();
            if ui.button("Exit").clicked() {
                self.exit(ctx);
            }
        });
    }

    fn render_page_list(&mut self, ui: &mut egui::Ui) {
        let session = &self.state.session;
        ui.heading("Pages");
        ui.label(format!(
            "{} page(s), {} transcribed",
            session.page_count(),
            session.transcribed_count()
        ));
        ui.separator();

        let rows: Vec<(usize, PageId, bool)> = session
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| (index + 1, page.id, page.is_transcribed()))
            .collect();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (number, id, transcribed) in rows {
                    let selected = self.state.selected_page == Some(number);
                    ui.horizontal(|ui| {
                        let thumb_size = egui::vec2(110.0, 80.0);
                        if let Some(texture) = self.thumbs.get(&id) {
                            ui.add(egui::Image::new(texture).fit_to_exact_size(thumb_size));
                        } else {
                            ui.allocate_ui_with_layout(
                                thumb_size,
                                egui::Layout::centered_and_justified(egui::Direction::LeftToRight),
                                |ui| {
                                    ui.label("...");
                                },
                            );
                        }
                        ui.vertical(|ui| {
                            if ui.selectable_label(selected, format!("Page {number}")).clicked() {
                                self.state.selected_page = Some(number);
                            }
                            let (tag, color) = if transcribed {
                                ("transcribed", Color32::from_rgb(120, 200, 120))
                            } else {
                                ("pending", Color32::from_gray(150))
                            };
                            ui.label(RichText::new(tag).color(color).size(11.0));
                        });
                    });
                    ui.add_space(6.0);
                }
            });
    }

    fn render_page_detail(&self, ui: &mut egui::Ui) {
        let Some(page) = self
            .state
            .selected_page
            .and_then(|number| self.state.session.page(number))
        else {
            ui.label("Select a page to see its transcript.");
            return;
        };
        match page.transcript.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                let mut text = text;
                ui.add(
                    egui::TextEdit::multiline(&mut text)
                        .desired_width(f32::INFINITY)
                        .desired_rows(8),
                );
            }
            Some(_) => {
                ui.label("No text was found on this page.");
            }
            None => {
                ui.label("Not transcribed yet.");
            }
        }
    }

    fn render_quiz(&self, ui: &mut egui::Ui) {
        let quiz = self.state.session.quiz();
        if quiz.is_empty() {
            ui.label("No quiz image. Copy the question and press \"Paste quiz\".");
            return;
        }
        if let Some(texture) = &self.quiz_texture {
            ui.add(egui::Image::new(texture).max_width(220.0));
        }
        if self.state.quiz_ocr_running {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Reading quiz text...");
            });
        } else if let Some(text) = quiz.transcript.as_deref() {
            let mut text = text;
            ui.add(
                egui::TextEdit::multiline(&mut text)
                    .desired_width(f32::INFINITY)
                    .desired_rows(4),
            );
        }

        if self.state.answering {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Waiting for the model...");
            });
        }

        match &self.state.quiz_outcome {
            Some(QuizOutcome::Answered(result)) => {
                ui.group(|ui| {
                    ui.label(RichText::new(&result.question).strong());
                    for (index, option) in result.options.iter().enumerate() {
                        let line = format!("{}. {}", reading_companion_common::option_letter(index), option);
                        if index == result.chosen_index {
                            ui.label(
                                RichText::new(format!("=> {line}"))
                                    .color(Color32::from_rgb(246, 196, 69))
                                    .strong(),
                            );
                        } else {
                            ui.label(format!("   {line}"));
                        }
                    }
                    ui.label(
                        RichText::new(format!("Model: {}", result.raw_response.trim()))
                            .color(Color32::from_gray(170))
                            .size(11.0),
                    );
                    ui.label(
                        RichText::new("Suggestion only. Choose the answer yourself.")
                            .color(Color32::from_gray(150))
                            .size(11.0),
                    );
                });
            }
            Some(QuizOutcome::Unavailable {
                message,
                raw_response,
            }) => {
                ui.group(|ui| {
                    ui.label(RichText::new(message).color(Color32::from_rgb(230, 110, 110)));
                    if let Some(raw) = raw_response {
                        ui.label(RichText::new("Model response:").strong());
                        ui.label(raw);
                    }
                });
            }
            None => {}
        }
    }

    fn render_log(&self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in self.state.log.lines() {
                    ui.label(
                        RichText::new(format!("[{}] {}", line.time, line.message))
                            .monospace()
                            .size(11.0),
                    );
                }
            });
    }
}

pub fn configure_fonts(ctx: &egui::Context) {
    let mut fonts = FontDefinitions::default();
    let candidates = [
        r"C:\Windows\Fonts\segoeui.ttf",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ];

    for path in candidates {
        if let Ok(data) = std::fs::read(path) {
            fonts.font_data.insert("ui_fallback".to_string(), FontData::from_owned(data));
            fonts
                .families
                .entry(FontFamily::Proportional)
                .or_default()
                .push("ui_fallback".to_string());
            ctx.set_fonts(fonts);
            return;
        }
    }
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages();
        self.process_pending_thumbs(ctx);
        if self.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_toolbar(ui, ctx);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("log")
            .resizable(true)
            .default_height(140.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Log").strong());
                    if let Some(latest) = self.state.log.latest() {
                        ui.label(RichText::new(latest).color(Color32::from_gray(170)));
                    }
                });
                ui.separator();
                self.render_log(ui);
            });

        egui::SidePanel::left("pages")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                self.render_page_list(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Quiz");
                ui.separator();
                self.render_quiz(ui);
                ui.add_space(12.0);
                ui.heading("Page transcript");
                ui.separator();
                self.render_page_detail(ui);
            });
        });
    }
}
