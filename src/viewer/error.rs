use serde::Serialize;

use crate::source::{RetrievalError, SourceError};

/// Errors returned by [`super::ViewerService`] operations
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// Missing, empty, or out-of-root file path
    #[error("A valid file path must be provided: {0}")]
    InvalidPath(String),

    /// The source could not be opened
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The scan could not be read
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// I/O error while listing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ViewerError {
    /// HTTP status an API layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ViewerError::InvalidPath(_)
            | ViewerError::Source(SourceError::NotFound(_))
            | ViewerError::Retrieval(RetrievalError::ScanOutOfRange { .. }) => 400,
            _ => 500,
        }
    }

    /// JSON error body carrying the status and message
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status_code(),
            detail: self.to_string(),
        }
    }
}

/// Error payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,
    /// Human-readable message
    pub detail: String,
}
