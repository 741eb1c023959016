use std::path::PathBuf;

use thiserror::Error;

use crate::format::{ScanNumber, ScanRange};

/// Errors raised while opening a source or creating an accessor.
///
/// These are setup failures: when they occur before conversion starts the run
/// is aborted, when a partition worker hits one its partition stays empty.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Path does not exist
    #[error("Source file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File is held open exclusively by another process
    #[error("Source file is locked: {0}")]
    Locked(String),

    /// Instrument is still writing the file
    #[error("Source file is still being acquired: {0}")]
    StillAcquiring(String),

    /// File could be opened but its contents are unusable
    #[error("Source file is corrupt: {0}")]
    Corrupt(String),

    /// The reader backing this format is unavailable in this build or platform
    #[error("Reader unavailable: {0}")]
    ReaderUnavailable(String),

    /// No reader is registered for this file type
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a single scan.
///
/// These are recovered per scan: the scan is skipped and the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Scan number outside the source's scan range
    #[error("Scan {scan} is outside the source range {range}")]
    ScanOutOfRange {
        /// Requested scan
        scan: ScanNumber,
        /// Range reported by the source
        range: ScanRange,
    },

    /// The source cannot provide this data for the scan
    #[error("Scan {scan} unsupported: {reason}")]
    Unsupported {
        /// Requested scan
        scan: ScanNumber,
        /// Why the data is unavailable
        reason: String,
    },

    /// Scan data exists but is malformed
    #[error("Scan {scan} is corrupt: {reason}")]
    Corrupt {
        /// Requested scan
        scan: ScanNumber,
        /// What was wrong
        reason: String,
    },

    /// Reading the scan failed
    #[error("Failed to read scan {scan}: {reason}")]
    Read {
        /// Requested scan
        scan: ScanNumber,
        /// Underlying failure
        reason: String,
    },
}

impl RetrievalError {
    /// Scan number the error refers to
    pub fn scan(&self) -> ScanNumber {
        match self {
            RetrievalError::ScanOutOfRange { scan, .. }
            | RetrievalError::Unsupported { scan, .. }
            | RetrievalError::Corrupt { scan, .. }
            | RetrievalError::Read { scan, .. } => *scan,
        }
    }

    /// Shorthand for [`RetrievalError::Unsupported`]
    pub fn unsupported(scan: ScanNumber, reason: impl Into<String>) -> Self {
        RetrievalError::Unsupported {
            scan,
            reason: reason.into(),
        }
    }
}
