//! Error types for refchat.
//!
//! A single error enum covers configuration, I/O, language model, prompt
//! and serialization failures. Search providers report their own
//! failures as data (see `refchat_search::ProviderError`); an `AppError`
//! always means the turn cannot be answered.

use thiserror::Error;

/// Unified error type for refchat.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language model errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
