//! Error types for the classifier.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad `max_len`, threshold or settings value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Vocabulary file missing, unreadable or malformed.
    #[error("vocabulary error: {0}")]
    Vocabulary(String),

    /// Model file malformed or inconsistent with its declared shape.
    #[error("model error: {0}")]
    Model(String),

    #[error("cannot encode an empty batch")]
    EmptyBatch,

    /// Raised by the detector front, never by the encoder itself.
    #[error("Please enter a message to predict.")]
    EmptyMessage,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
