use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reading_companion::browser::BrowserSession;
use reading_companion::capture;
use reading_companion::cli::{self, Cli, Commands};
use reading_companion::config::Config;
use reading_companion::error::{AssistError, Result};
use reading_companion::llm;
use reading_companion::logging;
use reading_companion::ocr::{OcrMode, TesseractOcr, Transcriber};
use reading_companion::scanner;
use reading_companion::transcribe::{self, BatchEvent, StopToken};
use reading_companion_common::{parse_quiz_text, BatchState, SessionStore};
use std::path::Path;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        if let Some(raw) = e.raw_response() {
            eprintln!("Model response:\n{}", raw);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(provider) = cli.ai_provider {
        config.llm.provider = provider;
    }
    logging::init(if cli.verbose { "debug" } else { config.log_level.as_str() });

    match cli.command {
        Commands::Transcribe { inputs, output } => {
            let files = scanner::collect_pages(&inputs)?;
            if files.is_empty() {
                return Err(AssistError::FileNotFound("no page images in the given inputs".into()));
            }

            let mut store = SessionStore::new();
            for file in &files {
                store.append_page(capture::load_image_file(file)?);
            }
            eprintln!("{} page(s) loaded", store.page_count());

            let ocr = TesseractOcr::from_config(&config.ocr);
            if !ocr.is_available().await {
                warn!(command = %config.ocr.command, "OCR engine did not answer --version");
            }

            let stop = StopToken::new();
            let ctrl_c = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\nStopping after the current page...");
                    ctrl_c.request_stop();
                }
            });

            let bar = ProgressBar::new(store.page_count() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let jobs = store.pending_pages();
            let mut events = Vec::new();
            let outcome = transcribe::run_batch(jobs, &ocr, &stop, |event| {
                match &event {
                    BatchEvent::PageStarted { page_number, .. } => {
                        bar.set_message(format!("page {}", page_number));
                    }
                    BatchEvent::PageDone { .. } => bar.inc(1),
                    BatchEvent::PageFailed { page_number, reason, .. } => {
                        bar.inc(1);
                        bar.println(format!("page {} failed: {}", page_number, reason));
                    }
                }
                events.push(event);
            })
            .await;
            bar.finish_and_clear();

            for event in &events {
                event.apply_to(&mut store);
            }

            let transcript = store.book_context();
            match output {
                Some(path) => {
                    std::fs::write(&path, &transcript)?;
                    eprintln!("Transcript written to {}", path.display());
                }
                None => println!("{}", transcript),
            }
            eprintln!(
                "{}: {}/{} page(s) transcribed, {} failed",
                outcome.state,
                store.transcribed_count(),
                store.page_count(),
                outcome.progress.failed
            );
            if outcome.state == BatchState::Failed {
                return Err(AssistError::Ocr("every page failed to transcribe".into()));
            }
        }

        Commands::Parse { input } => {
            let text = read_text(&input)?;
            let parsed = parse_quiz_text(&text);
            println!("Question: {}", parsed.question);
            for (i, option) in parsed.options.iter().enumerate() {
                println!("  {}. {}", reading_companion_common::option_letter(i), option);
            }
            parsed.ensure_answerable()?;
        }

        Commands::Answer { quiz, context } => {
            let quiz_text = if cli::is_text_file(&quiz) {
                read_text(&quiz)?
            } else {
                let image = capture::load_image_file(&quiz)?;
                let ocr = TesseractOcr::from_config(&config.ocr);
                ocr.transcribe(&image, OcrMode::Quiz).await?
            };

            let mut book_context = Vec::new();
            for path in &context {
                book_context.push(read_text(path)?);
            }
            let book_context = book_context.join("\n\n");

            let chooser = llm::create_chooser(&config.llm)?;
            info!(provider = config.llm.provider.name(), model = config.llm.model(), "asking for an answer");
            let result = llm::answer_quiz(chooser.as_ref(), &quiz_text, &book_context).await?;
            println!("{}", result.render());
        }

        Commands::Browser { fill_login, fill_lexile, headless } => {
            if headless {
                config.browser.headless = true;
            }
            let mut session = BrowserSession::launch(&config).await?;
            println!("Browser opened at {}", config.reader.base_url);

            if fill_login {
                if let Err(e) = session.fill_login_form().await {
                    warn!("could not fill the login form: {}", e);
                }
            }

            wait_for_enter("Log in manually in the browser window, then press Enter here...").await?;
            let landed = session.confirm_logged_in().await?;
            println!("Logged in, current page: {}", landed);

            if fill_lexile {
                match config.lexile {
                    Some(range) => {
                        if let Err(e) = session.fill_lexile_filter(range).await {
                            warn!("could not fill the Lexile filter: {}", e);
                        }
                    }
                    None => warn!("no Lexile range configured"),
                }
            }

            wait_for_enter("Press Enter to close the browser...").await?;
            session.quit().await?;
        }

        Commands::Config { show, init } => {
            if init {
                let path = Config::config_path()?;
                if path.exists() {
                    println!("Settings file already exists: {}", path.display());
                } else {
                    Config::default().save_to(&path)?;
                    println!("Settings file created: {}", path.display());
                }
            }

            if show || !init {
                println!("Settings:");
                for line in config.summary_lines() {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(AssistError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

async fn wait_for_enter(prompt: &str) -> Result<()> {
    println!("{}", prompt);
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await
    .map_err(|e| AssistError::Browser(e.to_string()))??;
    Ok(())
}
