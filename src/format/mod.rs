//! # Scan Artifact Format
//!
//! A compact, sequential binary stream of per-scan spectral data. All integers
//! are little-endian and all floating point values are IEEE-754 `f64`.
//!
//! ```text
//! [i32 total_scan_count]
//! repeated per emitted scan:
//!   [i32 scan_number]
//!   [u8  type_flag]        1 = centroid, 0 = profile
//!   [i32 point_count N]
//!   N x centroid: [f64 mass][f64 intensity][i32 charge]
//!   N x profile:  [f64 mass][f64 intensity]
//! ```
//!
//! `total_scan_count` is the size of the requested scan range. Scans that could
//! not be read are omitted, so the number of records may be smaller; readers
//! must consume records until end-of-stream.

mod decoder;
mod encoder;
mod error;
mod index;
mod types;


pub use decoder::{decode_record, read_artifact, Artifact, ArtifactReader};
pub use encoder::{encode_record, encoded_len, write_header, write_record};
pub use error::FormatError;
pub use index::{ArtifactIndex, IndexEntry};
pub use types::{
    CentroidPoint, ProfilePoint, ScanClassification, ScanNumber, ScanPayload, ScanRange,
    ScanRecord,
};

/// Size of the global scan-count header in bytes
pub const HEADER_SIZE: usize = 4;

/// Size of a record header (scan number + type flag + point count) in bytes
pub const RECORD_HEADER_SIZE: usize = 9;

/// Size of one centroid point (mass + intensity + charge) in bytes
pub const CENTROID_POINT_SIZE: usize = 20;

/// Size of one profile point (mass + intensity) in bytes
pub const PROFILE_POINT_SIZE: usize = 16;

/// Conventional file extension for artifacts
pub const ARTIFACT_EXTENSION: &str = "bin";
