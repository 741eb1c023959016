use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

use mzbin::validator::{validate_artifact, ValidationError};

use super::EXIT_VALIDATION_FAILURE;

/// Validate artifact integrity
pub fn run(file: PathBuf) -> Result<ExitCode> {
    info!("Validating {}", file.display());

    let report = match validate_artifact(&file) {
        Ok(report) => report,
        Err(ValidationError::StructureError(message)) => {
            eprintln!("Validation FAILED: {}: {}", file.display(), message);
            return Ok(ExitCode::from(EXIT_VALIDATION_FAILURE));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Could not validate {}", file.display()))
        }
    };

    println!("{}", report.format_colored());

    if report.has_failures() {
        Ok(ExitCode::from(EXIT_VALIDATION_FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
