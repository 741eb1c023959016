use serde::{Deserialize, Serialize};

use super::MetadataError;

/// File-level header information reported by the instrument file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralFileInformation {
    /// Raw file name as recorded by the source
    pub raw_file_name: String,

    /// File format revision
    pub raw_file_version: String,

    /// Creation timestamp as reported by the vendor library
    pub creation_date: Option<String>,

    /// Operator (who created the file)
    pub operator_name: String,

    /// Number of instruments (devices) recorded in the file
    pub number_of_instruments: i32,

    /// Free-text file description
    pub description: String,

    /// Instrument model (e.g., "Orbitrap Exploris 480")
    pub instrument_model: String,

    /// Instrument name
    pub instrument_name: String,

    /// Instrument serial number
    pub serial_number: String,

    /// Acquisition software version
    pub software_version: String,

    /// Instrument firmware / hardware version
    pub firmware_version: String,

    /// Units of the recorded signal
    pub units: String,

    /// Mass resolution from the run header
    pub mass_resolution: f64,

    /// Number of spectra in the file
    pub number_of_scans: i32,

    /// First scan number
    pub first_scan: i32,

    /// Last scan number
    pub last_scan: i32,

    /// Acquisition start time in minutes
    pub start_time: f64,

    /// Acquisition end time in minutes
    pub end_time: f64,

    /// Lowest acquired m/z
    pub low_mass: f64,

    /// Highest acquired m/z
    pub high_mass: f64,
}

/// Sample annotation stored with the acquisition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleInformation {
    /// Sample name
    pub sample_name: String,

    /// Sample identifier
    pub sample_id: String,

    /// Sample type (e.g., "Unknown", "Blank", "QC")
    pub sample_type: String,

    /// Free-text comment
    pub comment: String,

    /// Autosampler vial position
    pub vial: String,

    /// Sample volume
    pub sample_volume: f64,

    /// Injection volume
    pub injection_volume: f64,

    /// Sequence row number
    pub row_number: i32,

    /// Dilution factor
    pub dilution_factor: f64,
}

/// Run-level information a source can report about itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// File header information
    pub general: GeneralFileInformation,

    /// Sample annotation
    pub sample: SampleInformation,

    /// Labels of the per-scan trailer extra fields
    pub trailer_extra_fields: Vec<String>,

    /// Number of distinct scan filters in the run
    pub number_of_filters: usize,
}

impl RunInfo {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }
}
