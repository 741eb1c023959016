use serde::{Deserialize, Serialize};

use crate::format::{ScanNumber, ScanPayload, ScanRange};

/// Payload of the scan range query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanRangeResponse {
    /// First scan number
    pub first_scan_number: ScanNumber,
    /// Last scan number
    pub last_scan_number: ScanNumber,
}

impl From<ScanRange> for ScanRangeResponse {
    fn from(range: ScanRange) -> Self {
        Self {
            first_scan_number: range.first(),
            last_scan_number: range.last(),
        }
    }
}

/// Payload of the scan details query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanDetailsResponse {
    /// One-line description of the scan
    pub scan_details: String,
}

/// One centroid peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CentroidPeak {
    /// m/z
    pub mass: f64,
    /// Intensity
    pub intensity: f64,
    /// Charge state
    pub charge: i32,
}

/// One profile point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegmentedPoint {
    /// m/z
    pub mass: f64,
    /// Intensity
    pub intensity: f64,
}

/// Payload of the spectrum query; exactly one of the data arrays is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpectrumResponse {
    /// Scan number
    pub scan_number: ScanNumber,
    /// Centroid peaks of a centroid scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid_data: Option<Vec<CentroidPeak>>,
    /// Profile points of a profile scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmented_data: Option<Vec<SegmentedPoint>>,
}

impl SpectrumResponse {
    /// Build the response for a decoded payload
    pub fn new(scan_number: ScanNumber, payload: &ScanPayload) -> Self {
        match payload {
            ScanPayload::Centroid(points) => Self {
                scan_number,
                centroid_data: Some(
                    points
                        .iter()
                        .map(|p| CentroidPeak {
                            mass: p.mass,
                            intensity: p.intensity,
                            charge: p.charge,
                        })
                        .collect(),
                ),
                segmented_data: None,
            },
            ScanPayload::Profile(points) => Self {
                scan_number,
                centroid_data: None,
                segmented_data: Some(
                    points
                        .iter()
                        .map(|p| SegmentedPoint {
                            mass: p.mass,
                            intensity: p.intensity,
                        })
                        .collect(),
                ),
            },
        }
    }

    /// Number of peaks or points
    pub fn len(&self) -> usize {
        self.centroid_data.as_ref().map_or(0, Vec::len)
            + self.segmented_data.as_ref().map_or(0, Vec::len)
    }

    /// Whether the spectrum holds no data
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
