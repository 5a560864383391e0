//! Error types for the enrollment tool
//!
//! Only failures that stop the tool itself live here. Per-request failures of the
//! sign-in and registration calls are [`crate::service::CallFailure`] values and are
//! folded into row statuses by the batch runner instead of being propagated.

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnrollError>;

#[derive(Debug, Error)]
pub enum EnrollError {
    /// The uploaded file could not be decoded as a spreadsheet
    #[error("Spreadsheet parse error: {0}")]
    FileParse(String),
    /// File extension is not one of the accepted spreadsheet formats
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    /// HTTP client could not be constructed
    #[error("Network error: {0}")]
    Network(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A batch run is already in flight on this runner
    #[error("A batch run is already in progress")]
    RunInProgress,
}

impl From<reqwest::Error> for EnrollError {
    fn from(err: reqwest::Error) -> Self {
        EnrollError::Network(err.to_string())
    }
}

impl From<url::ParseError> for EnrollError {
    fn from(err: url::ParseError) -> Self {
        EnrollError::Config(format!("Invalid URL: {}", err))
    }
}

impl From<calamine::Error> for EnrollError {
    fn from(err: calamine::Error) -> Self {
        EnrollError::FileParse(err.to_string())
    }
}
