//! # mzbin - Parallel RAW to Binary Scan Conversion
//!
//! `mzbin` converts mass spectrometry acquisitions into a compact, append-only
//! binary stream of per-scan records, using a pool of workers that each own
//! their own reader.
//!
//! ## Key Features
//!
//! - **Simple Artifact Format**: a 4-byte scan count header followed by
//!   self-describing records (scan number, centroid/profile flag, point count,
//!   little-endian points). Readable to end-of-stream with no index.
//!
//! - **Order-Preserving Parallelism**: the scan range is cut into contiguous
//!   partitions, each worker writes a private sink, and the sinks are merged in
//!   worker order. The output is byte-identical to a sequential run.
//!
//! - **Skip, Don't Abort**: unreadable scans are logged and left out; a worker
//!   that cannot open the source contributes an empty partition.
//!
//! - **Atomic Output**: artifacts are assembled beside the destination and
//!   renamed into place, so a failed run never leaves a partial file.
//!
//! - **Run Metadata**: optional JSON sidecar with file, sample, and per-scan
//!   MS1/MS2 attributes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mzbin::convert::{ConversionConfig, Converter};
//! use mzbin::source::MemorySource;
//!
//! let source = MemorySource::synthetic(1_000, 64)?;
//! let converter = Converter::with_config(ConversionConfig::parallel(4));
//! let stats = converter.convert(&source, "synthetic.bin")?;
//! println!("{}", stats);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reading Artifacts
//!
//! ```rust,no_run
//! use mzbin::format::ArtifactReader;
//!
//! let mut reader = ArtifactReader::open("synthetic.bin")?;
//! println!("{} scans requested", reader.declared_scan_count());
//! while let Some(record) = reader.next_record()? {
//!     println!("scan {}: {} points", record.scan_number, record.payload.len());
//! }
//! # Ok::<(), mzbin::format::FormatError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`format`]: artifact codec, streaming reader, and random-access index
//! - [`source`]: scan source capability (Thermo RAW, artifacts, in-memory)
//! - [`convert`]: sequential, partitioned, and shared-sink writers plus the merger
//! - [`metadata`]: run metadata record and scan descriptions
//! - [`validator`]: artifact integrity checks
//! - [`viewer`]: spectrum viewer queries with JSON payloads
//!
//! ## Thermo RAW Support
//!
//! Reading `.raw` files requires the `thermo` feature and a .NET 8 runtime:
//!
//! ```bash
//! cargo build --release --features thermo
//! ```

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod convert;
pub mod format;
pub mod metadata;
pub mod source;
pub mod validator;
pub mod viewer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::convert::{
        ConversionConfig, ConversionError, ConversionStats, Converter, Merger, PartitionedWriter,
        SequentialWriter, SharedSinkWriter, SinkKind, WriteMode,
    };
    pub use crate::format::{
        read_artifact, ArtifactIndex, ArtifactReader, CentroidPoint, FormatError, ProfilePoint,
        ScanClassification, ScanNumber, ScanPayload, ScanRange, ScanRecord,
    };
    pub use crate::metadata::{extract_metadata, RunMetadata, ScanDetail};
    pub use crate::source::{
        open_source, MemorySource, RetrievalError, ScanAccessor, SourceError, SourceFactory,
    };
    pub use crate::validator::{validate_artifact, ValidationReport};
    pub use crate::viewer::{ViewerError, ViewerService};
}
