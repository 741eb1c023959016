use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mzbin::convert::{ConversionConfig, ConversionStats, Converter};
use mzbin::format::ARTIFACT_EXTENSION;
use mzbin::source::{open_source, SourceFactory};

use super::config;
use super::ConversionArgs;

/// Convert a source file into a scan artifact
pub fn run(input: PathBuf, output: Option<PathBuf>, args: ConversionArgs) -> Result<ExitCode> {
    let output = output.unwrap_or_else(|| default_output(&input));
    if same_file(&input, &output) {
        anyhow::bail!(
            "Output would overwrite the input {}; pass an explicit OUTPUT path",
            input.display()
        );
    }
    let config = config::resolve(&args)?;

    let factory = open_source(&input)
        .with_context(|| format!("Failed to open source {}", input.display()))?;
    convert(factory.as_ref(), &output, config)?;
    Ok(ExitCode::SUCCESS)
}

/// Run the converter and print its summary
pub(super) fn convert(
    factory: &dyn SourceFactory,
    output: &Path,
    config: ConversionConfig,
) -> Result<ConversionStats> {
    info!("mzbin Converter");
    info!("===============");
    info!("Input:   {}", factory.name());
    info!("Output:  {}", output.display());
    info!("Mode:    {}", config.mode);
    info!("Workers: {}", config.workers);
    if config.mode == mzbin::convert::WriteMode::Parallel {
        info!("Sink:    {}", config.sink);
    }

    let stats = Converter::with_config(config)
        .convert(factory, output)
        .with_context(|| format!("Conversion to {} failed", output.display()))?;

    print_summary(&stats, output);
    Ok(stats)
}

fn print_summary(stats: &ConversionStats, output: &Path) {
    println!("Conversion complete: {}", output.display());
    println!(
        "  Scans written: {} of {}",
        stats.scans_written, stats.scans_requested
    );
    if stats.scans_skipped > 0 {
        println!("  Scans skipped: {}", stats.scans_skipped);
    }
    if stats.failed_partitions > 0 {
        println!(
            "  Failed partitions: {} ({} scans missing)",
            stats.failed_partitions,
            stats.scans_missing()
        );
    }
    println!("  Points: {}", stats.points_written);
    println!(
        "  Size: {} bytes ({:.2} MB)",
        stats.bytes_written,
        stats.bytes_written as f64 / 1024.0 / 1024.0
    );
    if let Some(path) = &stats.metadata_path {
        println!("  Metadata: {}", path.display());
    }
    let rate = if stats.elapsed_seconds > 0.0 {
        stats.scans_written as f64 / stats.elapsed_seconds
    } else {
        0.0
    };
    println!(
        "  Time: {:.2}s ({:.0} scans/s, {} mode, {} workers)",
        stats.elapsed_seconds, rate, stats.mode, stats.workers
    );
}

fn default_output(input: &Path) -> PathBuf {
    input.with_extension(ARTIFACT_EXTENSION)
}

/// Whether both paths name the same file, resolving `.`/`..` and symlinks when both exist
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
