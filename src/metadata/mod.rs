//! # Run Metadata
//!
//! Structured description of a converted run: file header, sample annotation,
//! trailer field labels, and per-scan MS1/MS2 attributes. The record is
//! written as a JSON sidecar next to the artifact (`<artifact>.metadata.json`).
//!
//! MS2 master scan and monoisotopic m/z are resolved from the trailer extra
//! values first (`"Monoisotopic M/Z:"`, `"Master Scan Number:"`,
//! `"Master Scan Number"`, `"Master Index:"`), then from the scan's reaction.

mod error;
mod file_info;
mod record;
mod scan;

#[cfg(test)]
mod tests;

pub use error::MetadataError;
pub use file_info::{GeneralFileInformation, RunInfo, SampleInformation};
pub use record::{extract_metadata, sidecar_path, RunMetadata, METADATA_SUFFIX};
pub use scan::{
    format_scan_details, ms_order_label, DependentScans, Ms1Metadata, Ms2Metadata, Reaction,
    ScanDetail, ScanMetadata, TrailerEntry, MASTER_SCAN_LABELS, MONOISOTOPIC_LABELS,
};
