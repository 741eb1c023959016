use std::collections::HashSet;
use std::io::Read;

use crate::format::{ArtifactReader, ScanClassification, ScanNumber, ScanPayload};

use super::ValidationReport;

/// Scan numbers seen while walking the records
#[derive(Debug, Default)]
pub(crate) struct RecordSummary {
    pub(crate) scans: Vec<ScanNumber>,
    pub(crate) centroid: usize,
    pub(crate) points: usize,
    pub(crate) non_finite_points: usize,
    pub(crate) negative_intensities: usize,
}

impl RecordSummary {
    fn add(&mut self, scan: ScanNumber, payload: &ScanPayload) {
        self.scans.push(scan);
        self.points += payload.len();
        if payload.classification() == ScanClassification::Centroid {
            self.centroid += 1;
        }
        for (mass, intensity) in payload.mass_intensity() {
            if !mass.is_finite() || !intensity.is_finite() {
                self.non_finite_points += 1;
            } else if intensity < 0.0 {
                self.negative_intensities += 1;
            }
        }
    }
}

/// Step 2: decode every record and check scan numbering
pub(crate) fn check_records<R: Read>(
    mut reader: ArtifactReader<R>,
    report: &mut ValidationReport,
) -> RecordSummary {
    let declared = reader.declared_scan_count();
    let mut summary = RecordSummary::default();

    let decode_error = loop {
        match reader.next_record() {
            Ok(Some(record)) => summary.add(record.scan_number, &record.payload),
            Ok(None) => break None,
            Err(e) => break Some(e),
        }
    };
    match decode_error {
        None => report.pass("Records decode to end of stream"),
        Some(e) => report.fail(
            "Records decode to end of stream",
            format!("{} ({} records decoded before the error)", e, summary.scans.len()),
        ),
    }

    let facts = &mut report.facts;
    facts.records = summary.scans.len();
    facts.centroid_records = summary.centroid;
    facts.points = summary.points;
    facts.scan_bounds = summary
        .scans
        .iter()
        .min()
        .zip(summary.scans.iter().max())
        .map(|(&first, &last)| (first, last));

    check_scan_numbers(&summary.scans, report);
    check_count(declared, report);
    check_points(&summary, report);
    summary
}

fn check_scan_numbers(scans: &[ScanNumber], report: &mut ValidationReport) {
    let non_positive = scans.iter().filter(|&&s| s < 1).count();
    if non_positive == 0 {
        report.pass("Scan numbers positive");
    } else {
        report.fail(
            "Scan numbers positive",
            format!("{} records have a scan number below 1", non_positive),
        );
    }

    let mut seen = HashSet::with_capacity(scans.len());
    let duplicates: Vec<_> = scans.iter().filter(|s| !seen.insert(**s)).collect();
    if duplicates.is_empty() {
        report.pass("No duplicate scans");
    } else {
        report.fail(
            "No duplicate scans",
            format!(
                "{} duplicate records, first is scan {}",
                duplicates.len(),
                duplicates[0]
            ),
        );
    }

    // shared-sink output interleaves partitions, so disorder alone is not fatal
    match scans.windows(2).position(|w| w[1] <= w[0]) {
        None => report.pass("Scan numbers increasing"),
        Some(i) => report.warn(
            "Scan numbers increasing",
            format!(
                "scan {} follows scan {} (record {})",
                scans[i + 1],
                scans[i],
                i + 1
            ),
        ),
    }
}

fn check_count(declared: i32, report: &mut ValidationReport) {
    let records = report.facts.records;
    let missing = report.facts.missing_records();
    if records == declared.max(0) as usize {
        report.pass("Record count matches header");
    } else if missing > 0 {
        report.warn(
            "Record count matches header",
            format!(
                "header declares {} scans, {} records present ({} skipped or lost)",
                declared, records, missing
            ),
        );
    } else {
        report.fail(
            "Record count matches header",
            format!("header declares {} scans, {} records present", declared, records),
        );
    }
}

fn check_points(summary: &RecordSummary, report: &mut ValidationReport) {
    if summary.non_finite_points == 0 {
        report.pass("Finite mass and intensity");
    } else {
        report.warn(
            "Finite mass and intensity",
            format!("{} points hold NaN or infinite values", summary.non_finite_points),
        );
    }
    if summary.negative_intensities > 0 {
        report.warn(
            "Non-negative intensity",
            format!("{} points have negative intensity", summary.negative_intensities),
        );
    }
}
