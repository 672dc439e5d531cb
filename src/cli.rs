use crate::ai_provider::AiProvider;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reading-companion")]
#[command(about = "Book page transcription and quiz answer suggestions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the configured LLM provider (openai/ollama)
    #[arg(long, global = true)]
    pub ai_provider: Option<AiProvider>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// OCR page images in file-name order
    Transcribe {
        /// Page image files or folders of page images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write the joined transcript here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split quiz text into question and options
    Parse {
        /// Text file holding the OCR'd quiz
        #[arg(required = true)]
        input: PathBuf,
    },

    /// Suggest an answer for a quiz
    Answer {
        /// Quiz screenshot or text file
        #[arg(short, long, required = true)]
        quiz: PathBuf,

        /// Book transcript files used as context
        #[arg(short, long)]
        context: Vec<PathBuf>,
    },

    /// Open the reading platform for manual login
    Browser {
        /// Pre-fill the login form from READER_USERNAME / READER_PASSWORD
        #[arg(long)]
        fill_login: bool,

        /// Fill the Lexile filter from the configured range
        #[arg(long)]
        fill_lexile: bool,

        /// Run Chrome without a window
        #[arg(long)]
        headless: bool,
    },

    /// Show or create the settings file
    Config {
        /// Print the effective settings
        #[arg(long)]
        show: bool,

        /// Write a settings file with defaults
        #[arg(long)]
        init: bool,
    },
}

/// Quiz input given as an image or as already-transcribed text.
pub fn is_text_file(path: &std::path::Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_answer_args() {
        let cli = Cli::parse_from([
            "reading-companion",
            "answer",
            "--quiz",
            "quiz.png",
            "--context",
            "p1.txt",
            "--context",
            "p2.txt",
            "--ai-provider",
            "ollama",
        ]);
        assert_eq!(cli.ai_provider, Some(AiProvider::Ollama));
        match cli.command {
            Commands::Answer { quiz, context } => {
                assert_eq!(quiz, PathBuf::from("quiz.png"));
                assert_eq!(context.len(), 2);
            }
            _ => panic!("expected answer subcommand"),
        }
    }

    #[test]
    fn test_is_text_file() {
        assert!(is_text_file(std::path::Path::new("quiz.TXT")));
        assert!(!is_text_file(std::path::Path::new("quiz.png")));
    }
}
