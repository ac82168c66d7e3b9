//! Error types for mailsage.

use thiserror::Error;

/// Result type alias using mailsage's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mailsage operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Mailbox provider call failed (per query/folder/message unit)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Generation service call failed or timed out
    #[error("Inference error: {0}")]
    Inference(String),

    /// Model output violated a strict JSON contract
    #[error("Contract error: {0}")]
    Contract(String),

    /// Memory store operation failed
    #[error("Memory error: {0}")]
    Memory(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
