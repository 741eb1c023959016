//! # Scan Sources
//!
//! The converter depends only on the capability traits in this module, never
//! on a concrete reader. A [`SourceFactory`] is the opened file; it is shared
//! between partition workers and hands out independent [`ScanAccessor`]s. Each
//! accessor is owned by exactly one worker and is never locked.
//!
//! ## Implementations
//!
//! - [`MemorySource`]: in-memory scans with injectable failures
//! - [`ArtifactSource`]: a previously written artifact
//! - `ThermoSource`: Thermo RAW files (cargo feature `thermo`)

mod artifact;
mod error;
mod memory;
#[cfg(feature = "thermo")]
mod thermo;

#[cfg(test)]
mod tests;

use std::path::Path;

use crate::format::{
    CentroidPoint, ProfilePoint, ScanClassification, ScanNumber, ScanPayload, ScanRange,
    ARTIFACT_EXTENSION,
};
use crate::metadata::{RunInfo, ScanDetail};

pub use artifact::{ArtifactAccessor, ArtifactSource};
pub use error::{RetrievalError, SourceError};
pub use memory::{MemoryAccessor, MemorySource, MemorySourceBuilder};
#[cfg(feature = "thermo")]
pub use thermo::{ThermoAccessor, ThermoSource};

/// Extension of Thermo RAW files
pub const RAW_EXTENSION: &str = "raw";

/// An opened source that can create independent accessors.
///
/// `create_accessor` may be called concurrently from every partition worker.
pub trait SourceFactory: Send + Sync {
    /// Create a new accessor exclusively owned by the caller
    fn create_accessor(&self) -> Result<Box<dyn ScanAccessor>, SourceError>;

    /// Short display name (usually the file name)
    fn name(&self) -> String;
}

/// Random access to the scans of an opened source
pub trait ScanAccessor {
    /// Inclusive scan range of the source
    fn scan_range(&self) -> ScanRange;

    /// Whether the scan holds centroid or profile data
    fn classification(&mut self, scan: ScanNumber) -> Result<ScanClassification, RetrievalError>;

    /// Centroid peaks of a centroid scan
    fn centroid_points(&mut self, scan: ScanNumber) -> Result<Vec<CentroidPoint>, RetrievalError>;

    /// Profile samples of a profile scan
    fn profile_points(&mut self, scan: ScanNumber) -> Result<Vec<ProfilePoint>, RetrievalError>;

    /// Run-level file and sample information
    fn run_info(&mut self) -> Result<RunInfo, RetrievalError> {
        Err(RetrievalError::unsupported(
            0,
            "source does not report run information",
        ))
    }

    /// Per-scan attributes (time, filter, MS order, reaction, trailer)
    fn scan_detail(&mut self, scan: ScanNumber) -> Result<ScanDetail, RetrievalError> {
        Err(RetrievalError::unsupported(
            scan,
            "source does not report scan details",
        ))
    }
}

/// Classify a scan and fetch the matching point arrays
pub fn read_payload(
    accessor: &mut dyn ScanAccessor,
    scan: ScanNumber,
) -> Result<ScanPayload, RetrievalError> {
    let range = accessor.scan_range();
    if !range.contains(scan) {
        return Err(RetrievalError::ScanOutOfRange { scan, range });
    }
    match accessor.classification(scan)? {
        ScanClassification::Centroid => Ok(ScanPayload::Centroid(accessor.centroid_points(scan)?)),
        ScanClassification::Profile => Ok(ScanPayload::Profile(accessor.profile_points(scan)?)),
    }
}

/// Lower-cased file extension
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// Whether `path` has an extension [`open_source`] recognizes
pub fn is_supported_source(path: &Path) -> bool {
    matches!(
        extension_of(path).as_deref(),
        Some(RAW_EXTENSION) | Some(ARTIFACT_EXTENSION)
    )
}

/// Open a source file, choosing the reader from its extension.
///
/// `.raw` files need the `thermo` feature; `.bin` files are read as artifacts.
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<Box<dyn SourceFactory>, SourceError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    match extension_of(path).as_deref() {
        Some(RAW_EXTENSION) => open_raw(path),
        Some(ARTIFACT_EXTENSION) => Ok(Box::new(ArtifactSource::open(path)?)),
        Some(other) => Err(SourceError::UnsupportedFormat(format!(
            "unrecognized extension '.{}' for {}",
            other,
            path.display()
        ))),
        None => Err(SourceError::UnsupportedFormat(format!(
            "no file extension on {}",
            path.display()
        ))),
    }
}

#[cfg(feature = "thermo")]
fn open_raw(path: &Path) -> Result<Box<dyn SourceFactory>, SourceError> {
    Ok(Box::new(ThermoSource::open(path)?))
}

#[cfg(not(feature = "thermo"))]
fn open_raw(path: &Path) -> Result<Box<dyn SourceFactory>, SourceError> {
    Err(SourceError::ReaderUnavailable(format!(
        "{}: Thermo RAW support requires the 'thermo' feature. Rebuild with: cargo build --features thermo",
        path.display()
    )))
}
