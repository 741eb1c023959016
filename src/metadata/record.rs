use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::format::ScanRange;
use crate::source::{RetrievalError, ScanAccessor};

use super::file_info::{GeneralFileInformation, RunInfo, SampleInformation};
use super::scan::ScanMetadata;
use super::MetadataError;

/// Suffix appended to the artifact path for the metadata sidecar
pub const METADATA_SUFFIX: &str = ".metadata.json";

/// Complete metadata record written next to an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// File header information
    pub general: GeneralFileInformation,

    /// Sample annotation
    pub sample: SampleInformation,

    /// Labels of the per-scan trailer extra fields
    pub trailer_extra_fields: Vec<String>,

    /// Number of distinct scan filters
    pub number_of_filters: usize,

    /// Filter text of the first scan in the range
    pub first_scan_filter: Option<String>,

    /// Filter text of the last scan in the range
    pub last_scan_filter: Option<String>,

    /// Per-scan entries in increasing scan order
    pub scans: Vec<ScanMetadata>,

    /// Converter name
    pub converter: String,

    /// Converter version
    pub converter_version: String,

    /// When the record was produced
    pub converted_at: DateTime<Utc>,
}

impl RunMetadata {
    /// Create an empty record around the given run information
    pub fn new(run_info: RunInfo) -> Self {
        Self {
            general: run_info.general,
            sample: run_info.sample,
            trailer_extra_fields: run_info.trailer_extra_fields,
            number_of_filters: run_info.number_of_filters,
            first_scan_filter: None,
            last_scan_filter: None,
            scans: Vec::new(),
            converter: env!("CARGO_PKG_NAME").to_string(),
            converter_version: env!("CARGO_PKG_VERSION").to_string(),
            converted_at: Utc::now(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the record as JSON to `path`
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), MetadataError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a record previously written with [`RunMetadata::write_json`]
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Sidecar path for an artifact: `<artifact>.metadata.json`
pub fn sidecar_path<P: AsRef<Path>>(artifact: P) -> PathBuf {
    let mut name = artifact.as_ref().as_os_str().to_owned();
    name.push(METADATA_SUFFIX);
    PathBuf::from(name)
}

/// Collect run and per-scan metadata over `range`.
///
/// Sources without run information get a default header with the scan bounds
/// filled in. Scans whose detail cannot be read are logged and left out.
pub fn extract_metadata(accessor: &mut dyn ScanAccessor, range: ScanRange) -> RunMetadata {
    let run_info = match accessor.run_info() {
        Ok(info) => info,
        Err(RetrievalError::Unsupported { .. }) => {
            debug!("Source does not report run information; using defaults");
            RunInfo::default()
        }
        Err(e) => {
            warn!("Could not read run information: {}", e);
            RunInfo::default()
        }
    };

    let mut metadata = RunMetadata::new(run_info);
    if metadata.general.first_scan == 0 && metadata.general.last_scan == 0 {
        metadata.general.first_scan = range.first();
        metadata.general.last_scan = range.last();
        metadata.general.number_of_scans = range.header_count();
    }

    metadata.scans.reserve(range.len());
    for scan in range.iter() {
        match accessor.scan_detail(scan) {
            Ok(detail) => {
                if scan == range.first() {
                    metadata.first_scan_filter = Some(detail.filter_text.clone());
                }
                if scan == range.last() {
                    metadata.last_scan_filter = Some(detail.filter_text.clone());
                }
                metadata.scans.push(ScanMetadata::from(&detail));
            }
            Err(RetrievalError::Unsupported { .. }) if scan == range.first() => {
                debug!("Source does not report scan details; skipping per-scan metadata");
                break;
            }
            Err(e) => warn!("Skipping metadata for scan {}: {}", scan, e),
        }
    }

    metadata
}
