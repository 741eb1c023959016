use std::collections::HashSet;
use std::path::Path;

use crate::metadata::{sidecar_path, RunMetadata};

use super::data::RecordSummary;
use super::ValidationReport;

/// Step 3: compare the metadata sidecar, when present, with the records
pub(crate) fn check_sidecar(path: &Path, records: &RecordSummary, report: &mut ValidationReport) {
    let sidecar = sidecar_path(path);
    if !sidecar.exists() {
        return;
    }

    let metadata = match RunMetadata::read_json(&sidecar) {
        Ok(metadata) => metadata,
        Err(e) => {
            report.fail("Metadata sidecar readable", e.to_string());
            return;
        }
    };
    report.pass("Metadata sidecar readable");
    let model = &metadata.general.instrument_model;
    report.facts.instrument = (!model.is_empty()).then(|| model.clone());

    if metadata.scans.is_empty() {
        return;
    }
    let described: HashSet<_> = metadata.scans.iter().map(|s| s.scan_number).collect();
    let undescribed = records
        .scans
        .iter()
        .filter(|s| !described.contains(s))
        .count();
    if undescribed == 0 {
        report.pass("Metadata covers records");
    } else {
        report.warn(
            "Metadata covers records",
            format!("{} records have no metadata entry", undescribed),
        );
    }
}
