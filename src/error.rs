//! Error types for voxpoll

use std::io;
use thiserror::Error;

/// Main error type for voxpoll
#[derive(Error, Debug)]
pub enum VoxpollError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Survey error: {0}")]
    Survey(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Speech recognition error: {0}")]
    Recognition(String),

    #[error("Question {0} is already speaking or listening")]
    Busy(String),

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Event channel closed")]
    Channel,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for voxpoll operations
pub type Result<T> = std::result::Result<T, VoxpollError>;

impl From<String> for VoxpollError {
    fn from(s: String) -> Self {
        VoxpollError::Other(s)
    }
}

impl From<&str> for VoxpollError {
    fn from(s: &str) -> Self {
        VoxpollError::Other(s.to_string())
    }
}
