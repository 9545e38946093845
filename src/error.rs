//! Custom error types for paperdesk

use thiserror::Error;

/// Main error type for paperdesk operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A file could not be accepted or read
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// A question was rejected before any request was built
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend could not be reached or answered with something unreadable
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a failure status or an explicit error payload
    #[error("Service error: {0}")]
    Service(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for paperdesk
pub type Result<T> = std::result::Result<T, Error>;
