//! Error types for the CLI application.

use mediscript_domain::StatusError;
use mediscript_extractor::ExtractorError;
use mediscript_llm::LlmError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction failed; displayed with the user-facing message
    #[error("{}", .0.user_message())]
    Extraction(#[from] ExtractorError),

    /// Provider setup error
    #[error("Provider error: {0}")]
    Llm(#[from] LlmError),

    /// Session status error
    #[error("Session error: {0}")]
    Status(#[from] StatusError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not permitted
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),
}
