//! In-memory scan source.
//!
//! Holds scans as decoded payloads and lets callers inject retrieval failures
//! for individual scans and creation failures for individual accessors. Used by
//! the `demo` command, benchmarks, and tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::format::{
    CentroidPoint, ProfilePoint, ScanClassification, ScanNumber, ScanPayload, ScanRange,
};
use crate::metadata::{
    DependentScans, GeneralFileInformation, Reaction, RunInfo, SampleInformation, ScanDetail,
    TrailerEntry,
};

use super::{RetrievalError, ScanAccessor, SourceError, SourceFactory};

/// MS2 scans following each MS1 scan in synthetic data
const SYNTHETIC_DEPENDENTS: usize = 4;

#[derive(Debug, Clone)]
enum MemoryScan {
    Data(ScanPayload),
    Failing(RetrievalError),
}

#[derive(Debug)]
struct MemoryData {
    range: ScanRange,
    scans: BTreeMap<ScanNumber, MemoryScan>,
    run_info: Option<RunInfo>,
    details: BTreeMap<ScanNumber, ScanDetail>,
}

/// Source factory over scans held in memory
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    data: Arc<MemoryData>,
    failing_accessors: HashSet<usize>,
    accessors_created: AtomicUsize,
}

impl MemorySource {
    /// Start building a memory source
    pub fn builder() -> MemorySourceBuilder {
        MemorySourceBuilder::default()
    }

    /// Deterministic synthetic run of `scan_count` scans.
    ///
    /// Scans cycle through one MS1 profile scan followed by four MS2 centroid
    /// scans, each with `points_per_scan` points, retention times, precursor
    /// reactions, and trailer values.
    pub fn synthetic(scan_count: usize, points_per_scan: usize) -> Result<Self, SourceError> {
        let last = i32::try_from(scan_count)
            .map_err(|_| SourceError::Corrupt(format!("too many scans: {}", scan_count)))?;
        let mut builder = MemorySource::builder()
            .name("synthetic")
            .range(1, last)
            .run_info(synthetic_run_info(last));

        let mut master = 1;
        for scan in 1..=last {
            let cycle_position = (scan as usize - 1) % (SYNTHETIC_DEPENDENTS + 1);
            let retention_time = scan as f64 * 0.01;
            let mut detail = ScanDetail {
                scan_number: scan,
                retention_time,
                ionization_mode: "ElectroSpray".to_string(),
                ..Default::default()
            };

            if cycle_position == 0 {
                master = scan;
                let dependents = (last - scan).min(SYNTHETIC_DEPENDENTS as i32) as usize;
                let step = 1600.0 / points_per_scan.max(1) as f64;
                let points = (0..points_per_scan)
                    .map(|j| {
                        let intensity = 1000.0 * (1 + (scan as usize * 31 + j * 17) % 97) as f64;
                        ProfilePoint::new(400.0 + j as f64 * step, intensity)
                    })
                    .collect();
                builder = builder.scan(scan, ScanPayload::Profile(points));
                detail.ms_order = 1;
                detail.filter_text = "FTMS + p ESI Full ms [400.0000-2000.0000]".to_string();
                detail.dependents = (dependents > 0).then(|| DependentScans {
                    instrument_type: "Synthetic".to_string(),
                    count: dependents,
                });
            } else {
                let precursor = 500.0 + cycle_position as f64 * 100.25;
                let points = (0..points_per_scan)
                    .map(|j| {
                        let intensity = 100.0 * (1 + (scan as usize * 13 + j * 7) % 89) as f64;
                        CentroidPoint::new(150.0 + j as f64 * 2.5, intensity, (j % 4) as i32 + 1)
                    })
                    .collect();
                builder = builder.scan(scan, ScanPayload::Centroid(points));
                detail.ms_order = 2;
                detail.filter_text = format!("ITMS + c ESI d Full ms2 {:.4}@cid35.00", precursor);
                detail.reaction = Some(Reaction {
                    precursor_mass: precursor,
                    collision_energy: 35.0,
                    isolation_width: 2.0,
                    master_scan: Some(master),
                    monoisotopic_mz: None,
                });
                detail.trailer = vec![
                    TrailerEntry::new("Monoisotopic M/Z:", format!("{:.4}", precursor - 0.0021)),
                    TrailerEntry::new("Master Scan Number:", master.to_string()),
                ];
            }
            builder = builder.scan_detail(detail);
        }

        builder.build()
    }

    /// Number of accessors requested so far, including failed ones
    pub fn accessors_created(&self) -> usize {
        self.accessors_created.load(Ordering::SeqCst)
    }

    /// Scan range of the source
    pub fn scan_range(&self) -> ScanRange {
        self.data.range
    }
}

impl SourceFactory for MemorySource {
    fn create_accessor(&self) -> Result<Box<dyn ScanAccessor>, SourceError> {
        let index = self.accessors_created.fetch_add(1, Ordering::SeqCst);
        if self.failing_accessors.contains(&index) {
            return Err(SourceError::ReaderUnavailable(format!(
                "accessor {} of '{}' could not be created",
                index, self.name
            )));
        }
        Ok(Box::new(MemoryAccessor {
            data: Arc::clone(&self.data),
        }))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Accessor sharing the immutable scan store of its [`MemorySource`]
#[derive(Debug, Clone)]
pub struct MemoryAccessor {
    data: Arc<MemoryData>,
}

impl MemoryAccessor {
    fn lookup(&self, scan: ScanNumber) -> Result<&ScanPayload, RetrievalError> {
        if !self.data.range.contains(scan) {
            return Err(RetrievalError::ScanOutOfRange {
                scan,
                range: self.data.range,
            });
        }
        match self.data.scans.get(&scan) {
            Some(MemoryScan::Data(payload)) => Ok(payload),
            Some(MemoryScan::Failing(error)) => Err(error.clone()),
            None => Err(RetrievalError::Read {
                scan,
                reason: "no data recorded for scan".to_string(),
            }),
        }
    }
}

impl ScanAccessor for MemoryAccessor {
    fn scan_range(&self) -> ScanRange {
        self.data.range
    }

    fn classification(&mut self, scan: ScanNumber) -> Result<ScanClassification, RetrievalError> {
        Ok(self.lookup(scan)?.classification())
    }

    fn centroid_points(&mut self, scan: ScanNumber) -> Result<Vec<CentroidPoint>, RetrievalError> {
        match self.lookup(scan)? {
            ScanPayload::Centroid(points) => Ok(points.clone()),
            ScanPayload::Profile(_) => Err(RetrievalError::unsupported(
                scan,
                "profile scan has no centroid stream",
            )),
        }
    }

    fn profile_points(&mut self, scan: ScanNumber) -> Result<Vec<ProfilePoint>, RetrievalError> {
        match self.lookup(scan)? {
            ScanPayload::Profile(points) => Ok(points.clone()),
            ScanPayload::Centroid(_) => Err(RetrievalError::unsupported(
                scan,
                "centroid scan has no profile trace",
            )),
        }
    }

    fn run_info(&mut self) -> Result<RunInfo, RetrievalError> {
        self.data
            .run_info
            .clone()
            .ok_or_else(|| RetrievalError::unsupported(0, "no run information recorded"))
    }

    fn scan_detail(&mut self, scan: ScanNumber) -> Result<ScanDetail, RetrievalError> {
        self.data
            .details
            .get(&scan)
            .cloned()
            .ok_or_else(|| RetrievalError::unsupported(scan, "no scan detail recorded"))
    }
}

/// Builder for [`MemorySource`]
#[derive(Debug, Default)]
pub struct MemorySourceBuilder {
    name: Option<String>,
    range: Option<(ScanNumber, ScanNumber)>,
    scans: BTreeMap<ScanNumber, MemoryScan>,
    run_info: Option<RunInfo>,
    details: BTreeMap<ScanNumber, ScanDetail>,
    failing_accessors: HashSet<usize>,
}

impl MemorySourceBuilder {
    /// Display name of the source
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Explicit scan range; defaults to the lowest and highest scan added
    pub fn range(mut self, first: ScanNumber, last: ScanNumber) -> Self {
        self.range = Some((first, last));
        self
    }

    /// Add a scan with the given payload
    pub fn scan(mut self, scan: ScanNumber, payload: ScanPayload) -> Self {
        self.scans.insert(scan, MemoryScan::Data(payload));
        self
    }

    /// Add a profile scan from (mass, intensity) pairs
    pub fn profile_scan(self, scan: ScanNumber, points: &[(f64, f64)]) -> Self {
        let points = points
            .iter()
            .map(|&(mass, intensity)| ProfilePoint::new(mass, intensity))
            .collect();
        self.scan(scan, ScanPayload::Profile(points))
    }

    /// Add a centroid scan from (mass, intensity, charge) triples
    pub fn centroid_scan(self, scan: ScanNumber, points: &[(f64, f64, i32)]) -> Self {
        let points = points
            .iter()
            .map(|&(mass, intensity, charge)| CentroidPoint::new(mass, intensity, charge))
            .collect();
        self.scan(scan, ScanPayload::Centroid(points))
    }

    /// Make every retrieval of `scan` fail with a corrupt-scan error
    pub fn failing_scan(mut self, scan: ScanNumber, reason: impl Into<String>) -> Self {
        self.scans.insert(
            scan,
            MemoryScan::Failing(RetrievalError::Corrupt {
                scan,
                reason: reason.into(),
            }),
        );
        self
    }

    /// Make the `index`-th accessor creation (0-based) fail
    pub fn failing_accessor(mut self, index: usize) -> Self {
        self.failing_accessors.insert(index);
        self
    }

    /// Run-level information returned by accessors
    pub fn run_info(mut self, run_info: RunInfo) -> Self {
        self.run_info = Some(run_info);
        self
    }

    /// Per-scan detail returned by accessors
    pub fn scan_detail(mut self, detail: ScanDetail) -> Self {
        self.details.insert(detail.scan_number, detail);
        self
    }

    /// Build the source
    pub fn build(self) -> Result<MemorySource, SourceError> {
        let (first, last) = match self.range {
            Some(bounds) => bounds,
            None => {
                let first = self.scans.keys().next().copied();
                let last = self.scans.keys().next_back().copied();
                first.zip(last).ok_or_else(|| {
                    SourceError::Corrupt("memory source holds no scans".to_string())
                })?
            }
        };
        let range = ScanRange::new(first, last).map_err(|e| SourceError::Corrupt(e.to_string()))?;

        Ok(MemorySource {
            name: self.name.unwrap_or_else(|| "memory".to_string()),
            data: Arc::new(MemoryData {
                range,
                scans: self.scans,
                run_info: self.run_info,
                details: self.details,
            }),
            failing_accessors: self.failing_accessors,
            accessors_created: AtomicUsize::new(0),
        })
    }
}

fn synthetic_run_info(last: ScanNumber) -> RunInfo {
    RunInfo {
        general: GeneralFileInformation {
            raw_file_name: "synthetic.raw".to_string(),
            raw_file_version: "66".to_string(),
            number_of_instruments: 1,
            description: "Synthetic DDA run".to_string(),
            instrument_model: "Synthetic Orbitrap".to_string(),
            instrument_name: "Synthetic".to_string(),
            serial_number: "SYN-0001".to_string(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            units: "None".to_string(),
            mass_resolution: 0.5,
            number_of_scans: last,
            first_scan: 1,
            last_scan: last,
            start_time: 0.01,
            end_time: last as f64 * 0.01,
            low_mass: 150.0,
            high_mass: 2000.0,
            ..Default::default()
        },
        sample: SampleInformation {
            sample_name: "synthetic".to_string(),
            sample_type: "Unknown".to_string(),
            dilution_factor: 1.0,
            ..Default::default()
        },
        trailer_extra_fields: vec![
            "Monoisotopic M/Z:".to_string(),
            "Master Scan Number:".to_string(),
        ],
        number_of_filters: 2,
    }
}
