//! Error types

use thiserror::Error;

/// Shared error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result alias
pub type Result<T> = std::result::Result<T, Error>;
