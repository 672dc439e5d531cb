pub mod ai_provider;
pub mod browser;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod ocr;
pub mod scanner;
pub mod transcribe;
