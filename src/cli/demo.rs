use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

use mzbin::source::MemorySource;

use super::config;
use super::ConversionArgs;

/// Convert a synthetic run
pub fn run(output: PathBuf, scans: usize, points: usize, args: ConversionArgs) -> Result<ExitCode> {
    if scans == 0 {
        anyhow::bail!("--scans must be at least 1");
    }
    let config = config::resolve(&args)?;

    info!(
        "Generating synthetic run: {} scans, {} points per scan",
        scans, points
    );
    let source = MemorySource::synthetic(scans, points).context("Failed to build synthetic run")?;
    super::convert::convert(&source, &output, config)?;
    Ok(ExitCode::SUCCESS)
}
