//! Thermo RAW source backed by `thermorawfilereader`.
//!
//! Every accessor opens its own `RawFileReader`, so partition workers read
//! the file through independent handles. Spectrum indices are 0-based in the
//! reader and scan numbers are `index + 1`.

use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thermorawfilereader::schema::SpectrumMode;
use thermorawfilereader::{RawFileReader, RawSpectrum};

use crate::format::{
    CentroidPoint, ProfilePoint, ScanClassification, ScanNumber, ScanRange,
};
use crate::metadata::{DependentScans, GeneralFileInformation, Reaction, RunInfo, ScanDetail};

use super::{RetrievalError, ScanAccessor, SourceError, SourceFactory, RAW_EXTENSION};

/// Ionization tokens that can appear in a Thermo filter string
const IONIZATION_TOKENS: &[&str] = &[
    "ESI", "NSI", "APCI", "APPI", "MALDI", "EI", "CI", "FAB", "TSP", "FD", "PSI", "GD",
];

/// Check if the current platform supports Thermo RAW file reading.
fn check_platform_support() -> Result<(), SourceError> {
    // Thermo's RawFileReader .NET assemblies only support x86/x86_64 architectures
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        return Err(SourceError::ReaderUnavailable(format!(
            "architecture '{}' is not supported; Thermo RAW reading requires x86/x86_64",
            std::env::consts::ARCH
        )));
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Ok(())
}

fn open_reader(path: &Path) -> Result<RawFileReader, SourceError> {
    let mut reader = RawFileReader::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => {
            SourceError::Locked(format!("{}: {}", path.display(), e))
        }
        _ => SourceError::Corrupt(format!("{}: {}", path.display(), e)),
    })?;
    // Keep the native signal continuity; classification decides the arrays
    reader.set_centroid_spectra(false);
    reader.set_signal_loading(true);
    Ok(reader)
}

/// Source factory over a Thermo RAW file
#[derive(Debug, Clone)]
pub struct ThermoSource {
    path: PathBuf,
    range: ScanRange,
}

impl ThermoSource {
    /// Validate and open a RAW file.
    ///
    /// # Errors
    /// - `SourceError::ReaderUnavailable` on unsupported architectures
    /// - `SourceError::NotFound` / `SourceError::UnsupportedFormat` for bad paths
    /// - `SourceError::Locked` / `SourceError::Corrupt` if the reader cannot open it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        check_platform_support()?;

        let path = path.as_ref();
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        if path.extension().map(|e| e.to_ascii_lowercase()) != Some(RAW_EXTENSION.into()) {
            return Err(SourceError::UnsupportedFormat(format!(
                "Expected .raw extension: {}",
                path.display()
            )));
        }

        let reader = open_reader(path)?;
        let last = i32::try_from(reader.len())
            .map_err(|_| SourceError::Corrupt(format!("{}: too many spectra", path.display())))?;
        if last == 0 {
            return Err(SourceError::Corrupt(format!(
                "{}: file contains no spectra",
                path.display()
            )));
        }
        let range = ScanRange::new(1, last)
            .map_err(|e| SourceError::Corrupt(format!("{}: {}", path.display(), e)))?;
        debug!("Opened {} with scans {}", path.display(), range);

        Ok(Self {
            path: path.to_path_buf(),
            range,
        })
    }
}

impl SourceFactory for ThermoSource {
    fn create_accessor(&self) -> Result<Box<dyn ScanAccessor>, SourceError> {
        Ok(Box::new(ThermoAccessor {
            reader: open_reader(&self.path)?,
            range: self.range,
        }))
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Accessor owning one `RawFileReader`
pub struct ThermoAccessor {
    reader: RawFileReader,
    range: ScanRange,
}

impl ThermoAccessor {
    fn spectrum(&mut self, scan: ScanNumber) -> Result<RawSpectrum, RetrievalError> {
        if !self.range.contains(scan) {
            return Err(RetrievalError::ScanOutOfRange {
                scan,
                range: self.range,
            });
        }
        self.reader
            .get((scan - 1) as usize)
            .ok_or_else(|| RetrievalError::Read {
                scan,
                reason: "reader returned no spectrum".to_string(),
            })
    }

    /// Read a spectrum without its signal arrays
    fn describe(&mut self, scan: ScanNumber) -> Result<RawSpectrum, RetrievalError> {
        self.reader.set_signal_loading(false);
        let spectrum = self.spectrum(scan);
        self.reader.set_signal_loading(true);
        spectrum
    }

    fn mass_intensity(&mut self, scan: ScanNumber) -> Result<Vec<(f64, f64)>, RetrievalError> {
        let raw = self.spectrum(scan)?;
        let Some(data) = raw.data() else {
            return Ok(Vec::new());
        };
        let mz = data.mz();
        let intensity = data.intensity();
        if mz.len() != intensity.len() {
            return Err(RetrievalError::Corrupt {
                scan,
                reason: format!(
                    "m/z and intensity arrays differ in length ({} vs {})",
                    mz.len(),
                    intensity.len()
                ),
            });
        }
        Ok(mz
            .iter()
            .zip(intensity.iter())
            .map(|(&m, &i)| (m, i as f64))
            .collect())
    }

    fn dependent_count(&mut self, scan: ScanNumber) -> usize {
        let mut count = 0;
        let mut next = scan + 1;
        while self.range.contains(next) {
            match self.describe(next) {
                Ok(raw) if raw.ms_level() > 1 => count += 1,
                _ => break,
            }
            next += 1;
        }
        count
    }
}

impl ScanAccessor for ThermoAccessor {
    fn scan_range(&self) -> ScanRange {
        self.range
    }

    fn classification(&mut self, scan: ScanNumber) -> Result<ScanClassification, RetrievalError> {
        let raw = self.describe(scan)?;
        match raw.view().mode() {
            SpectrumMode::Centroid => Ok(ScanClassification::Centroid),
            SpectrumMode::Profile => Ok(ScanClassification::Profile),
            _ => Err(RetrievalError::unsupported(scan, "unknown spectrum mode")),
        }
    }

    // The reader exposes no charge array; centroid charges are written as 0
    fn centroid_points(&mut self, scan: ScanNumber) -> Result<Vec<CentroidPoint>, RetrievalError> {
        Ok(self
            .mass_intensity(scan)?
            .into_iter()
            .map(|(mass, intensity)| CentroidPoint::new(mass, intensity, 0))
            .collect())
    }

    fn profile_points(&mut self, scan: ScanNumber) -> Result<Vec<ProfilePoint>, RetrievalError> {
        Ok(self
            .mass_intensity(scan)?
            .into_iter()
            .map(|(mass, intensity)| ProfilePoint::new(mass, intensity))
            .collect())
    }

    fn run_info(&mut self) -> Result<RunInfo, RetrievalError> {
        let model = self.reader.instrument_model();
        let description = self.reader.file_description();
        let general = GeneralFileInformation {
            instrument_model: model.model().unwrap_or("Unknown").to_string(),
            software_version: model.software_version().unwrap_or_default().to_string(),
            creation_date: description.creation_date().map(|s| s.to_string()),
            number_of_instruments: 1,
            number_of_scans: self.range.header_count(),
            first_scan: self.range.first(),
            last_scan: self.range.last(),
            ..Default::default()
        };
        Ok(RunInfo {
            general,
            ..Default::default()
        })
    }

    fn scan_detail(&mut self, scan: ScanNumber) -> Result<ScanDetail, RetrievalError> {
        let raw = self.describe(scan)?;
        let filter_text = raw
            .view()
            .filter_string()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let ms_order = raw.ms_level();

        let reaction = raw.precursor().map(|precursor| {
            let window = precursor.isolation_window();
            let parent = precursor.parent_index() as i64 + 1;
            Reaction {
                precursor_mass: precursor.mz(),
                collision_energy: precursor.activation().collision_energy() as f64,
                isolation_width: (window.upper() - window.lower()) as f64,
                master_scan: i32::try_from(parent).ok().filter(|&s| s > 0),
                monoisotopic_mz: None,
            }
        });

        let dependents = if ms_order == 1 {
            let count = self.dependent_count(scan);
            (count > 0).then(|| DependentScans {
                instrument_type: instrument_type(&filter_text),
                count,
            })
        } else {
            None
        };

        Ok(ScanDetail {
            scan_number: scan,
            retention_time: raw.time(),
            ionization_mode: ionization_mode(&filter_text),
            filter_text,
            ms_order,
            reaction,
            trailer: Vec::new(),
            dependents,
        })
    }
}

/// Analyzer prefix of a filter string (e.g. "FTMS", "ITMS")
fn instrument_type(filter: &str) -> String {
    filter
        .split_whitespace()
        .next()
        .unwrap_or("Unknown")
        .to_string()
}

/// Ionization token of a filter string, if present
fn ionization_mode(filter: &str) -> String {
    filter
        .split_whitespace()
        .find(|token| IONIZATION_TOKENS.contains(token))
        .unwrap_or("Unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path() {
        let result = ThermoSource::open("/nonexistent/file.raw");
        assert!(matches!(
            result,
            Err(SourceError::NotFound(_)) | Err(SourceError::ReaderUnavailable(_))
        ));
    }

    #[test]
    fn test_filter_string_parsing() {
        let filter = "FTMS + p NSI Full ms [350.0000-1800.0000]";
        assert_eq!(instrument_type(filter), "FTMS");
        assert_eq!(ionization_mode(filter), "NSI");
        assert_eq!(ionization_mode(""), "Unknown");
    }
}
