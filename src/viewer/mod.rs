//! # Spectrum Viewer Queries
//!
//! The query layer behind a spectrum viewer: list the source files of a
//! directory, report a file's scan range, describe a scan, and return its
//! peaks. Responses serialize with the PascalCase keys browser clients expect
//! (`FirstScanNumber`, `ScanDetails`, `CentroidData`, `SegmentedData`, ...).
//!
//! No network transport is bundled; [`ViewerError::status_code`] gives the
//! HTTP status a transport should answer with, and the `view` CLI command
//! prints the JSON payloads.
//!
//! ```rust,no_run
//! use mzbin::viewer::ViewerService;
//!
//! let viewer = ViewerService::new("data");
//! for file in viewer.list_files()? {
//!     let range = viewer.scan_range(&file)?;
//!     println!("{}: {}", file, serde_json::to_string(&range).unwrap_or_default());
//! }
//! # Ok::<(), mzbin::viewer::ViewerError>(())
//! ```

mod error;
mod responses;
mod service;


pub use error::{ErrorResponse, ViewerError};
pub use responses::{
    CentroidPeak, ScanDetailsResponse, ScanRangeResponse, SegmentedPoint, SpectrumResponse,
};
pub use service::ViewerService;
