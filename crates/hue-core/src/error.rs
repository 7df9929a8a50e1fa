//! Error types for hue-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hue-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Translation table is too small to be trusted
    #[error("too few translated entries ({found}), refusing to merge")]
    TooFewEntries { found: usize },

    /// Translation document has no header row
    #[error("translation file has no header row")]
    MissingHeader,

    /// Header declares a different language
    #[error("translation file is for language '{found}', expected '{expected}'")]
    LanguageMismatch { expected: String, found: String },

    /// Host handed over a line table with nothing but a header
    #[error("game line table has no content lines")]
    EmptyLineTable,

    /// A panic was caught at the host boundary
    #[error("panicked: {0}")]
    Panicked(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
