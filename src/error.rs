//! Error types for bulletin building, storage and rendering

use thiserror::Error;

/// Result type alias for bulletin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, storing or rendering bulletins
#[derive(Error, Debug)]
pub enum Error {
    /// Wizard input failed validation
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Wizard action attempted in the wrong step
    #[error("Invalid wizard step: {0}")]
    InvalidStep(String),

    /// Invalid configuration (themes, presets, config files)
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Persistent storage could not be read or written
    #[error("Storage error: {0}")]
    StorageError(String),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to lay out or rasterize a bulletin
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Network error talking to the sports data provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A bulletin or game id did not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "net")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Error::RenderError(format!("PNG encoding failed: {}", err))
    }
}
