use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::format::{ArtifactReader, FormatError, ARTIFACT_EXTENSION, HEADER_SIZE};

use super::{ValidationError, ValidationReport};

/// Step 1: the file exists and starts with a scan count header
pub(crate) fn check_structure(
    path: &Path,
    report: &mut ValidationReport,
) -> Result<ArtifactReader<BufReader<File>>, ValidationError> {
    if !path.is_file() {
        report.fail("File exists", format!("Not a file: {}", path.display()));
        return Err(ValidationError::StructureError(format!(
            "{} is not a file",
            path.display()
        )));
    }
    report.pass("File exists");

    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ARTIFACT_EXTENSION));
    if has_extension {
        report.pass("Artifact extension");
    } else {
        report.warn(
            "Artifact extension",
            format!("Expected a .{} file", ARTIFACT_EXTENSION),
        );
    }

    report.facts.file_size = path.metadata()?.len();

    match ArtifactReader::open(path) {
        Ok(reader) => {
            let declared = reader.declared_scan_count();
            report.facts.declared_scan_count = Some(declared);
            if declared < 0 {
                report.fail("Header", format!("Negative declared scan count {}", declared));
            } else {
                report.pass("Header");
            }
            Ok(reader)
        }
        Err(FormatError::MissingHeader) => {
            report.fail(
                "Header",
                format!(
                    "File holds {} bytes, header needs {}",
                    report.facts.file_size, HEADER_SIZE
                ),
            );
            Err(ValidationError::StructureError("missing header".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
