/// Errors that can occur while extracting or persisting run metadata
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// I/O error writing or reading a metadata file
    #[error("Failed to access metadata file: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The source could not provide a value needed for the record
    #[error("Source retrieval error: {0}")]
    Retrieval(#[from] crate::source::RetrievalError),
}
