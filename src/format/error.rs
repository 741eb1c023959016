/// Errors that can occur while encoding or decoding scan artifacts
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Stream ended before the 4-byte scan count header
    #[error("Artifact header missing or truncated")]
    MissingHeader,

    /// Stream ended in the middle of a record
    #[error("Truncated record for scan {scan_number} at byte offset {offset}")]
    TruncatedRecord {
        /// Scan number of the incomplete record (0 if the scan number itself was cut)
        scan_number: i32,
        /// Byte offset where the record starts
        offset: u64,
    },

    /// Type flag other than 0 (profile) or 1 (centroid)
    #[error("Invalid type flag: {0}")]
    InvalidTypeFlag(u8),

    /// Negative point count in a record header
    #[error("Invalid point count {count} for scan {scan_number}")]
    InvalidPointCount {
        /// Scan number of the offending record
        scan_number: i32,
        /// Decoded point count
        count: i32,
    },

    /// Scan range bounds violate `1 <= first <= last`
    #[error("Invalid scan range: {0}")]
    InvalidScanRange(String),

    /// Payload too large for the 32-bit point count field
    #[error("Scan {scan_number} has {count} points, exceeding the format limit")]
    PayloadTooLarge {
        /// Scan number of the offending payload
        scan_number: i32,
        /// Number of points
        count: usize,
    },
}
