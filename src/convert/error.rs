use crate::format::FormatError;
use crate::metadata::MetadataError;
use crate::source::SourceError;

/// Errors that abort a conversion run.
///
/// Per-scan retrieval failures never surface here; they are recorded as
/// skipped scans. Partition accessor failures are recorded per partition.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The source could not be opened or queried before writing started
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    /// Encoding a record or writing the artifact stream failed
    #[error("Format error: {0}")]
    FormatError(#[from] FormatError),

    /// I/O error on partition sinks or the output file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Writing the metadata sidecar failed
    #[error("Metadata error: {0}")]
    MetadataError(#[from] MetadataError),

    /// The worker thread pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// The progress reporter thread failed
    #[error("Progress reporter error: {0}")]
    ReporterError(String),

    /// Invalid conversion configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
