/*!
 * Error types for the cuebatch library.
 *
 * This module contains custom error types for the different collaborators of a
 * translation run, using the thiserror crate for ergonomic error definitions.
 * Only `SubtitleError` is fatal for a run; the others are absorbed by the
 * orchestrator's degrade paths.
 */

use thiserror::Error;

/// Errors that can occur when calling a translation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Errors raised by a language detector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// The text carries no usable signal (too short, digits only, ...)
    #[error("Not enough text to detect a language")]
    InsufficientText,

    /// The text uses a script shared by too many languages to decide
    #[error("Language is ambiguous for script: {0}")]
    Ambiguous(String),
}

/// Errors from the persistent cache backend
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store could not be opened or initialized
    #[error("Failed to open cache store: {0}")]
    Open(String),

    /// A lookup or upsert failed
    #[error("Cache query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// The blocking task running the query panicked or was cancelled
    #[error("Cache task failed: {0}")]
    Task(String),
}

/// Errors while reading or writing subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The subtitle file could not be read
    #[error("Failed to read subtitle file {path}: {message}")]
    Read {
        /// Path of the input file
        path: String,
        /// Underlying error message
        message: String,
    },

    /// The subtitle content is not valid SRT
    #[error("Invalid SRT content at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The translated subtitles could not be written
    #[error("Failed to write subtitle file {path}: {message}")]
    Write {
        /// Path of the output file
        path: String,
        /// Underlying error message
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
