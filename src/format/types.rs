use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::FormatError;

/// Scan identifier as stored on disk (signed 32-bit, always >= 1 for valid scans)
pub type ScanNumber = i32;

/// Inclusive range of scan numbers reported by a source.
///
/// Both bounds are inclusive and at least 1; `first <= last` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanRange {
    first: ScanNumber,
    last: ScanNumber,
}

impl ScanRange {
    /// Create a validated scan range
    pub fn new(first: ScanNumber, last: ScanNumber) -> Result<Self, FormatError> {
        if first < 1 {
            return Err(FormatError::InvalidScanRange(format!(
                "first scan must be >= 1, got {}",
                first
            )));
        }
        if last < first {
            return Err(FormatError::InvalidScanRange(format!(
                "last scan {} precedes first scan {}",
                last, first
            )));
        }
        Ok(Self { first, last })
    }

    /// First scan number (inclusive)
    pub fn first(&self) -> ScanNumber {
        self.first
    }

    /// Last scan number (inclusive)
    pub fn last(&self) -> ScanNumber {
        self.last
    }

    /// Number of scans in the range
    pub fn len(&self) -> usize {
        (self.last as i64 - self.first as i64 + 1) as usize
    }

    /// A validated range is never empty; provided for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Scan count as written into the artifact header
    pub fn header_count(&self) -> i32 {
        // first >= 1 and last <= i32::MAX, so the count always fits
        self.last - self.first + 1
    }

    /// Whether `scan` lies inside the range
    pub fn contains(&self, scan: ScanNumber) -> bool {
        scan >= self.first && scan <= self.last
    }

    /// Iterate scan numbers in increasing order
    pub fn iter(&self) -> RangeInclusive<ScanNumber> {
        self.first..=self.last
    }
}

impl fmt::Display for ScanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// Whether a scan holds centroided (label) peaks or a continuous profile trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanClassification {
    /// Peak-picked data with charge annotation
    Centroid,
    /// Continuous intensity trace without charges
    Profile,
}

impl ScanClassification {
    /// On-disk type flag (1 = centroid, 0 = profile)
    pub fn type_flag(&self) -> u8 {
        match self {
            ScanClassification::Centroid => 1,
            ScanClassification::Profile => 0,
        }
    }

    /// Parse an on-disk type flag
    pub fn from_type_flag(flag: u8) -> Result<Self, FormatError> {
        match flag {
            1 => Ok(ScanClassification::Centroid),
            0 => Ok(ScanClassification::Profile),
            other => Err(FormatError::InvalidTypeFlag(other)),
        }
    }
}

impl fmt::Display for ScanClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanClassification::Centroid => write!(f, "centroid"),
            ScanClassification::Profile => write!(f, "profile"),
        }
    }
}

/// A single centroid peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentroidPoint {
    /// Peak m/z
    pub mass: f64,
    /// Peak intensity
    pub intensity: f64,
    /// Charge state (0 when unknown)
    pub charge: i32,
}

impl CentroidPoint {
    /// Create a centroid peak
    pub fn new(mass: f64, intensity: f64, charge: i32) -> Self {
        Self {
            mass,
            intensity,
            charge,
        }
    }
}

/// A single profile sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Sample m/z
    pub mass: f64,
    /// Sample intensity
    pub intensity: f64,
}

impl ProfilePoint {
    /// Create a profile sample
    pub fn new(mass: f64, intensity: f64) -> Self {
        Self { mass, intensity }
    }
}

/// Numeric payload of one scan; the variant carries the classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScanPayload {
    /// Centroid peaks (mass, intensity, charge)
    Centroid(Vec<CentroidPoint>),
    /// Profile samples (mass, intensity)
    Profile(Vec<ProfilePoint>),
}

impl ScanPayload {
    /// Classification implied by the payload variant
    pub fn classification(&self) -> ScanClassification {
        match self {
            ScanPayload::Centroid(_) => ScanClassification::Centroid,
            ScanPayload::Profile(_) => ScanClassification::Profile,
        }
    }

    /// Number of data points
    pub fn len(&self) -> usize {
        match self {
            ScanPayload::Centroid(points) => points.len(),
            ScanPayload::Profile(points) => points.len(),
        }
    }

    /// Whether the scan has no data points
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty payload of the given classification
    pub fn empty(classification: ScanClassification) -> Self {
        match classification {
            ScanClassification::Centroid => ScanPayload::Centroid(Vec::new()),
            ScanClassification::Profile => ScanPayload::Profile(Vec::new()),
        }
    }

    /// (mass, intensity) pairs regardless of classification
    pub fn mass_intensity(&self) -> Vec<(f64, f64)> {
        match self {
            ScanPayload::Centroid(points) => {
                points.iter().map(|p| (p.mass, p.intensity)).collect()
            }
            ScanPayload::Profile(points) => {
                points.iter().map(|p| (p.mass, p.intensity)).collect()
            }
        }
    }
}

/// One decoded artifact record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Scan number
    pub scan_number: ScanNumber,
    /// Scan payload
    pub payload: ScanPayload,
}

impl ScanRecord {
    /// Create a record
    pub fn new(scan_number: ScanNumber, payload: ScanPayload) -> Self {
        Self {
            scan_number,
            payload,
        }
    }

    /// Classification of the record
    pub fn classification(&self) -> ScanClassification {
        self.payload.classification()
    }
}
