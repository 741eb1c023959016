//! # Artifact Validation Module
//!
//! Integrity checks for scan artifacts produced by the converter.
//!
//! ## Validation Checklist
//!
//! 1. **Structure Check**: the file exists and carries the 4-byte scan count header
//! 2. **Record Check**: every record decodes up to a clean end-of-stream, scan
//!    numbers are positive, unique, and increasing, and the record count does
//!    not exceed the declared count (fewer records is a warning: skipped scans)
//! 3. **Metadata Check**: if a `<artifact>.metadata.json` sidecar exists, it
//!    parses and describes the recorded scans
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mzbin::validator::validate_artifact;
//! use std::path::Path;
//!
//! match validate_artifact(Path::new("run.bin")) {
//!     Ok(report) => println!("{}", report),
//!     Err(e) => eprintln!("Validation failed: {}", e),
//! }
//! ```

use std::path::Path;

pub use report::{ArtifactFacts, CheckStatus, Tally, ValidationCheck, ValidationReport};

mod data;
mod metadata;
mod report;
mod structure;

/// Validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The file is missing or too short to hold a header
    #[error("Structure error: {0}")]
    StructureError(String),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the artifact codec
    #[error("Format error: {0}")]
    FormatError(#[from] crate::format::FormatError),
}

/// Main validation entry point.
///
/// Returns a report for any file whose header could be read; per-check
/// failures are recorded in the report rather than returned as errors.
pub fn validate_artifact(path: &Path) -> Result<ValidationReport, ValidationError> {
    let mut report = ValidationReport::new(path.to_path_buf());

    // 1. Structure Check
    let reader = structure::check_structure(path, &mut report)?;

    // 2. Record Check
    let records = data::check_records(reader, &mut report);

    // 3. Metadata Check
    metadata::check_sidecar(path, &records, &mut report);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::format::{encode_record, write_header, ScanPayload, ProfilePoint};

    fn artifact(declared: i32, scans: &[i32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_header(&mut bytes, declared).unwrap();
        for &scan in scans {
            let payload = ScanPayload::Profile(vec![ProfilePoint::new(100.0, 5.0)]);
            bytes.extend(encode_record(scan, &payload).unwrap());
        }
        bytes
    }

    fn validate_bytes(bytes: &[u8]) -> ValidationReport {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.bin");
        fs::write(&path, bytes).unwrap();
        validate_artifact(&path).unwrap()
    }

    fn status<'a>(report: &'a ValidationReport, name: &str) -> &'a CheckStatus {
        report.status(name).unwrap()
    }

    #[test]
    fn test_validation_report_display() {
        let mut report = ValidationReport::new("test.bin");
        report.facts.file_size = 61;
        report.facts.declared_scan_count = Some(2);
        report.facts.records = 1;
        report.facts.points = 3;
        report.facts.scan_bounds = Some((4, 4));
        report.record("Header", CheckStatus::Pass);
        report.record("Record count matches header", CheckStatus::Warn("one missing".into()));
        report.record("No duplicate scans", CheckStatus::Fail("scan 4 twice".into()));

        let output = format!("{}", report);
        assert!(output.starts_with("test.bin (61 bytes)\n"));
        assert!(output.contains("1 records for 2 declared scans, 0 centroid / 1 profile, 3 points"));
        assert!(output.contains("scans 4-4"));
        assert!(output.contains("  PASS Header\n"));
        assert!(output.contains("  WARN Record count matches header: one missing\n"));
        assert!(output.contains("  FAIL No duplicate scans: scan 4 twice\n"));
        assert!(output.contains("Validation FAILED (1 passed, 1 warnings, 1 failed)"));
        assert_eq!(
            report.tally(),
            Tally {
                passed: 1,
                warnings: 1,
                failed: 1
            }
        );
        assert_eq!(report.facts.missing_records(), 1);
    }

    #[test]
    fn test_valid_artifact_passes() {
        let report = validate_bytes(&artifact(3, &[1, 2, 3]));
        assert!(!report.has_failures());
        assert!(!report.has_warnings());
        assert_eq!(*status(&report, "Record count matches header"), CheckStatus::Pass);
        assert!(report.to_string().contains("Validation PASSED (9 passed, 0 warnings, 0 failed)"));
    }

    #[test]
    fn test_facts_describe_the_artifact() {
        let bytes = artifact(5, &[2, 3, 7]);
        let report = validate_bytes(&bytes);
        let facts = &report.facts;
        assert_eq!(facts.file_size, bytes.len() as u64);
        assert_eq!(facts.declared_scan_count, Some(5));
        assert_eq!(facts.records, 3);
        assert_eq!(facts.centroid_records, 0);
        assert_eq!(facts.profile_records(), 3);
        assert_eq!(facts.points, 3);
        assert_eq!(facts.scan_bounds, Some((2, 7)));
        assert_eq!(facts.missing_records(), 2);
        assert!(facts.instrument.is_none());
    }

    #[test]
    fn test_fewer_records_than_declared_warns() {
        let report = validate_bytes(&artifact(5, &[1, 2, 4]));
        assert!(!report.has_failures());
        assert!(matches!(
            status(&report, "Record count matches header"),
            CheckStatus::Warn(_)
        ));
    }

    #[test]
    fn test_more_records_than_declared_fails() {
        let report = validate_bytes(&artifact(1, &[1, 2]));
        assert!(report.has_failures());
    }

    #[test]
    fn test_duplicate_and_unordered_scans() {
        let report = validate_bytes(&artifact(4, &[3, 1, 3]));
        assert!(matches!(status(&report, "No duplicate scans"), CheckStatus::Fail(_)));
        assert!(matches!(
            status(&report, "Scan numbers increasing"),
            CheckStatus::Warn(_)
        ));
    }

    #[test]
    fn test_truncated_record_fails() {
        let mut bytes = artifact(2, &[1, 2]);
        bytes.truncate(bytes.len() - 3);
        let report = validate_bytes(&bytes);
        assert!(matches!(
            status(&report, "Records decode to end of stream"),
            CheckStatus::Fail(_)
        ));
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        fs::write(&path, [1u8, 0]).unwrap();
        assert!(matches!(
            validate_artifact(&path),
            Err(ValidationError::StructureError(_))
        ));
        assert!(validate_artifact(&dir.path().join("absent.bin")).is_err());
    }

    #[test]
    fn test_unexpected_extension_warns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.dat");
        fs::write(&path, artifact(1, &[1])).unwrap();
        let report = validate_artifact(&path).unwrap();
        assert!(matches!(status(&report, "Artifact extension"), CheckStatus::Warn(_)));
    }
}
