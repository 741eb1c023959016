use serde::{Deserialize, Serialize};

use crate::format::ScanNumber;

/// Trailer labels carrying the monoisotopic precursor m/z
pub const MONOISOTOPIC_LABELS: &[&str] = &["Monoisotopic M/Z:"];

/// Trailer labels carrying the master (parent) scan number
pub const MASTER_SCAN_LABELS: &[&str] =
    &["Master Scan Number:", "Master Scan Number", "Master Index:"];

/// Human-readable MS order as reported by the vendor enumeration
pub fn ms_order_label(ms_order: u8) -> String {
    match ms_order {
        0 => "Unknown".to_string(),
        1 => "Ms".to_string(),
        n => format!("Ms{}", n),
    }
}

/// Precursor reaction of an MSn scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// Precursor m/z
    pub precursor_mass: f64,
    /// Collision energy
    pub collision_energy: f64,
    /// Isolation window width in m/z
    pub isolation_width: f64,
    /// Master scan reported by the scan event, if any
    pub master_scan: Option<ScanNumber>,
    /// Monoisotopic m/z reported by the scan event, if any
    pub monoisotopic_mz: Option<f64>,
}

/// One trailer extra (label, value) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailerEntry {
    /// Label, including any trailing colon the vendor writes
    pub label: String,
    /// Raw text value
    pub value: String,
}

impl TrailerEntry {
    /// Create a trailer entry
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Data-dependent scans triggered by an MS1 scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentScans {
    /// Instrument type reported with the dependents
    pub instrument_type: String,
    /// Number of dependent scans
    pub count: usize,
}

/// Per-scan attributes as reported by a source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanDetail {
    /// Scan number
    pub scan_number: ScanNumber,
    /// Retention time in minutes
    pub retention_time: f64,
    /// Scan filter text
    pub filter_text: String,
    /// MS order (1 = MS1, 2 = MS2, 0 = unknown)
    pub ms_order: u8,
    /// Ionization mode (e.g., "ElectroSpray", "NSI")
    pub ionization_mode: String,
    /// First precursor reaction for MSn scans
    pub reaction: Option<Reaction>,
    /// Trailer extra values in source order
    pub trailer: Vec<TrailerEntry>,
    /// Dependent scans for MS1 scans, when the source reports them
    pub dependents: Option<DependentScans>,
}

impl ScanDetail {
    /// First trailer value whose label matches one of `labels`
    pub fn trailer_value(&self, labels: &[&str]) -> Option<&str> {
        self.trailer
            .iter()
            .find(|entry| labels.contains(&entry.label.as_str()))
            .map(|entry| entry.value.trim())
    }

    /// Master scan from the trailer, falling back to the reaction, else 0
    pub fn master_scan(&self) -> ScanNumber {
        self.trailer_value(MASTER_SCAN_LABELS)
            .and_then(|v| v.parse::<ScanNumber>().ok())
            .or_else(|| self.reaction.as_ref().and_then(|r| r.master_scan))
            .unwrap_or(0)
    }

    /// Monoisotopic m/z from the trailer, falling back to the reaction, else 0.0
    pub fn monoisotopic_mass(&self) -> f64 {
        self.trailer_value(MONOISOTOPIC_LABELS)
            .and_then(|v| v.parse::<f64>().ok())
            .or_else(|| self.reaction.as_ref().and_then(|r| r.monoisotopic_mz))
            .unwrap_or(0.0)
    }
}

/// MS1 attributes stored in the metadata record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ms1Metadata {
    /// Instrument type reported with the dependent scans
    pub raw_file_instrument_type: String,
    /// Number of dependent scans
    pub num_dependent_scans: usize,
}

/// MS2 attributes stored in the metadata record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ms2Metadata {
    /// Master (parent) scan number
    pub master_scan: ScanNumber,
    /// Ionization mode
    pub ionization_mode: String,
    /// MS order label
    pub order: String,
    /// Precursor m/z
    pub precursor_mass: f64,
    /// Monoisotopic precursor m/z
    pub monoisotopic_mass: f64,
    /// Collision energy
    pub collision_energy: f64,
    /// Isolation window width
    pub isolation_width: f64,
}

/// Per-scan entry of the metadata record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanMetadata {
    /// Scan number
    pub scan_number: ScanNumber,
    /// Retention time in minutes
    pub retention_time: f64,
    /// Present for MS1 scans with reported dependents
    pub ms1: Option<Ms1Metadata>,
    /// Present for MS2 scans
    pub ms2: Option<Ms2Metadata>,
}

impl From<&ScanDetail> for ScanMetadata {
    fn from(detail: &ScanDetail) -> Self {
        let mut metadata = ScanMetadata {
            scan_number: detail.scan_number,
            retention_time: detail.retention_time,
            ..Default::default()
        };

        match detail.ms_order {
            1 => {
                metadata.ms1 = detail.dependents.as_ref().map(|d| Ms1Metadata {
                    raw_file_instrument_type: d.instrument_type.clone(),
                    num_dependent_scans: d.count,
                });
            }
            2 => {
                let reaction = detail.reaction.clone().unwrap_or_default();
                metadata.ms2 = Some(Ms2Metadata {
                    master_scan: detail.master_scan(),
                    ionization_mode: detail.ionization_mode.clone(),
                    order: ms_order_label(detail.ms_order),
                    precursor_mass: reaction.precursor_mass,
                    monoisotopic_mass: detail.monoisotopic_mass(),
                    collision_energy: reaction.collision_energy,
                    isolation_width: reaction.isolation_width,
                });
            }
            // higher orders are recorded with time only
            _ => {}
        }

        metadata
    }
}

/// One-line description of a scan as shown by the spectrum viewer
pub fn format_scan_details(detail: &ScanDetail) -> String {
    let scan = detail.scan_number;
    let time = detail.retention_time;
    match detail.ms_order {
        2 => {
            let reaction = detail.reaction.clone().unwrap_or_default();
            format!(
                "Scan number {} @ time {:.2} - Master scan = {}, Ionization mode = {}, MS Order = {}, Precursor mass = {:.4}, Monoisotopic Mass = {:.4}, Collision energy = {:.2}, Isolation width = {:.2}",
                scan,
                time,
                detail.master_scan(),
                detail.ionization_mode,
                ms_order_label(detail.ms_order),
                reaction.precursor_mass,
                detail.monoisotopic_mass(),
                reaction.collision_energy,
                reaction.isolation_width,
            )
        }
        1 => match &detail.dependents {
            Some(dependents) => format!(
                "Scan number {} @ time {:.2} - Instrument type = {}, Number of dependent scans = {}",
                scan, time, dependents.instrument_type, dependents.count
            ),
            None => format!("Scan number {} @ time {:.2} - No dependent scans found.", scan, time),
        },
        _ => format!("Scan number {} @ time {:.2} - Unknown MS Order.", scan, time),
    }
}
