// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Parse failure in {path}: {message}")]
    ParseFailure { path: String, message: String },

    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl PipelineError {
    /// Stable taxonomy name reported to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedLanguage(_) => "UnsupportedLanguage",
            PipelineError::EmptyInput(_) => "EmptyInput",
            PipelineError::ParseFailure { .. } => "ParseFailure",
            PipelineError::GenerationFailure(_) => "GenerationFailure",
            PipelineError::Config(_) => "Config",
            PipelineError::Validation(_) => "Validation",
            PipelineError::FileOperation { .. } | PipelineError::Io(_) => "Io",
            PipelineError::Serialization(_) => "Serialization",
            PipelineError::Server(_) => "Server",
        }
    }

    /// Errors caused by the submitted request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedLanguage(_)
                | PipelineError::EmptyInput(_)
                | PipelineError::Validation(_)
        )
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}
