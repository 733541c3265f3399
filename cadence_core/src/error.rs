//! Error types for the cadence_core library.
//!
//! The scheduler itself is total and never produces these; they come from the
//! storage, parsing and validation layers around it.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cadence_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Deck file could not be read or written
    #[error("State error: {0}")]
    State(String),

    /// No flashcard matches the given identifier
    #[error("Flashcard not found: {0}")]
    NotFound(String),

    /// An id prefix matches more than one flashcard
    #[error("Ambiguous flashcard id '{0}' matches more than one card")]
    AmbiguousId(String),

    /// Recall score rejected at the submission boundary
    #[error("Invalid recall score: {0}")]
    InvalidScore(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
