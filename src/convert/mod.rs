//! # Conversion Pipeline
//!
//! Walks a scan range of a [`SourceFactory`], encodes every readable scan, and
//! writes a single artifact.
//!
//! ## Modes
//!
//! - [`WriteMode::Sequential`]: one accessor, scans in increasing order
//! - [`WriteMode::Parallel`]: the range is split into contiguous partitions,
//!   written concurrently into private sinks and merged in worker order
//! - [`WriteMode::Shared`]: concurrent workers append to one mutex-guarded
//!   stream; records are not globally ordered
//!
//! ## Failure policy
//!
//! - A scan that cannot be read is skipped and logged; the run continues.
//! - A partition whose accessor cannot be created contributes no records.
//! - Failing to open the source or to write the output aborts the run, and
//!   the output path is left untouched.
//!
//! ## Example
//!
//! ```no_run
//! use mzbin::convert::{ConversionConfig, Converter};
//!
//! let converter = Converter::with_config(ConversionConfig::parallel(4));
//! let stats = converter.convert_path("run.raw", "run.bin")?;
//! println!("{}", stats);
//! # Ok::<(), mzbin::convert::ConversionError>(())
//! ```

mod error;
mod merge;
mod parallel;
mod partition;
mod report;
mod scan;
mod sequential;
mod shared;

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use log::info;
use serde::{Deserialize, Serialize};

use crate::format::ScanNumber;
use crate::metadata::{extract_metadata, sidecar_path};
use crate::source::{open_source, SourceFactory};

pub use error::ConversionError;
pub use merge::{write_atomically, Merger};
pub use parallel::{ParallelStats, PartitionSink, PartitionStats, PartitionedWriter, SinkKind};
pub use partition::{partition_range, Partition};
pub use report::{ProgressEvent, ProgressReporter, ProgressSender, ProgressSummary};
pub use scan::{ScanOutcome, ScanWriter, WriteStats};
pub use sequential::SequentialWriter;
pub use shared::SharedSinkWriter;

/// How the artifact is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Single accessor, single stream
    Sequential,
    /// Private per-partition sinks merged in worker order
    #[default]
    #[serde(alias = "partitioned")]
    Parallel,
    /// One mutex-guarded sink shared by all workers (unordered)
    Shared,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Sequential => write!(f, "sequential"),
            WriteMode::Parallel => write!(f, "parallel"),
            WriteMode::Shared => write!(f, "shared"),
        }
    }
}

impl FromStr for WriteMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(WriteMode::Sequential),
            "parallel" | "partitioned" => Ok(WriteMode::Parallel),
            "shared" => Ok(WriteMode::Shared),
            other => Err(ConversionError::InvalidConfig(format!(
                "unknown write mode '{}', expected 'sequential', 'parallel' or 'shared'",
                other
            ))),
        }
    }
}

/// Number of workers used when none is configured
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

/// Configuration for a conversion run
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// Write mode
    pub mode: WriteMode,

    /// Worker (and partition) count for the parallel modes
    pub workers: usize,

    /// Partition sink kind for [`WriteMode::Parallel`]
    pub sink: SinkKind,

    /// Directory for partition temp files (system temp dir when `None`)
    pub temp_dir: Option<PathBuf>,

    /// Log a progress line every N processed scans (0 disables)
    pub progress_interval: usize,

    /// Write `<output>.metadata.json` next to the artifact
    pub write_metadata: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            mode: WriteMode::Parallel,
            workers: default_workers(),
            sink: SinkKind::File,
            temp_dir: None,
            progress_interval: 1000,
            write_metadata: false,
        }
    }
}

impl ConversionConfig {
    /// Single-threaded conversion
    pub fn sequential() -> Self {
        Self {
            mode: WriteMode::Sequential,
            workers: 1,
            ..Self::default()
        }
    }

    /// Partitioned conversion with `workers` workers
    pub fn parallel(workers: usize) -> Self {
        Self {
            mode: WriteMode::Parallel,
            workers,
            ..Self::default()
        }
    }

    /// Set the write mode
    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the partition sink kind
    pub fn with_sink(mut self, sink: SinkKind) -> Self {
        self.sink = sink;
        self
    }

    /// Set the partition temp directory
    pub fn with_temp_dir(mut self, temp_dir: Option<PathBuf>) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    /// Set the progress interval
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Enable or disable the metadata sidecar
    pub fn with_metadata(mut self, write_metadata: bool) -> Self {
        self.write_metadata = write_metadata;
        self
    }

    /// Check the configuration before a run
    pub fn validate(&self) -> Result<(), ConversionError> {
        if self.mode != WriteMode::Sequential && self.workers == 0 {
            return Err(ConversionError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if let Some(dir) = &self.temp_dir {
            if !dir.is_dir() {
                return Err(ConversionError::InvalidConfig(format!(
                    "temp directory does not exist: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Summary of a conversion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Source display name
    pub source_name: String,
    /// Write mode used
    pub mode: WriteMode,
    /// Workers used (1 for sequential)
    pub workers: usize,
    /// Scans in the requested range (the header count)
    pub scans_requested: usize,
    /// Records written
    pub scans_written: usize,
    /// Scans skipped after retrieval failures
    pub scans_skipped: usize,
    /// Points across all records
    pub points_written: usize,
    /// Artifact size in bytes
    pub bytes_written: u64,
    /// Partitions whose worker could not start
    pub failed_partitions: usize,
    /// Skipped scan numbers in increasing order
    pub skipped_scans: Vec<ScanNumber>,
    /// Per-partition statistics for the parallel modes
    pub partitions: Vec<PartitionStats>,
    /// Metadata sidecar, when written
    pub metadata_path: Option<PathBuf>,
    /// Wall-clock time in seconds
    pub elapsed_seconds: f64,
}

impl ConversionStats {
    /// Scans that produced no record, whether skipped or lost with a partition
    pub fn scans_missing(&self) -> usize {
        self.scans_requested.saturating_sub(self.scans_written)
    }
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Converted {}: {} of {} scans written ({} skipped), {} points, {} bytes, {} mode with {} workers in {:.2}s",
            self.source_name,
            self.scans_written,
            self.scans_requested,
            self.scans_skipped,
            self.points_written,
            self.bytes_written,
            self.mode,
            self.workers,
            self.elapsed_seconds
        )?;
        if self.failed_partitions > 0 {
            write!(f, ", {} partitions failed", self.failed_partitions)?;
        }
        Ok(())
    }
}

/// Top-level driver owning the output file lifecycle
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConversionConfig,
}

impl Converter {
    /// Converter with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter with a custom configuration
    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Open `input` with [`open_source`] and convert it to `output`
    pub fn convert_path<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ConversionStats, ConversionError> {
        let factory = open_source(input)?;
        self.convert(factory.as_ref(), output)
    }

    /// Convert the full scan range of `factory` into the artifact `output`.
    ///
    /// The artifact is written atomically. Per-scan failures are skipped and
    /// reported in the returned statistics.
    pub fn convert<P: AsRef<Path>>(
        &self,
        factory: &dyn SourceFactory,
        output: P,
    ) -> Result<ConversionStats, ConversionError> {
        let output = output.as_ref();
        let start = Instant::now();
        self.config.validate()?;

        let mut primary = factory.create_accessor()?;
        let range = primary.scan_range();
        let workers = match self.config.mode {
            WriteMode::Sequential => 1,
            _ => self.config.workers,
        };
        info!(
            "Converting {} (scans {}) to {} using {} mode with {} workers",
            factory.name(),
            range,
            output.display(),
            self.config.mode,
            workers
        );

        let reporter = ProgressReporter::start(range.len(), self.config.progress_interval)?;
        let result: Result<(Vec<PartitionStats>, WriteStats), ConversionError> =
            match self.config.mode {
                WriteMode::Sequential => {
                    let writer = SequentialWriter::new().with_progress(reporter.sender());
                    write_atomically(output, |w| writer.write(primary.as_mut(), range, w))
                        .map(|totals| (Vec::new(), totals))
                }
                WriteMode::Parallel => PartitionedWriter::new(workers)
                    .with_sink(self.config.sink)
                    .with_temp_dir(self.config.temp_dir.clone())
                    .with_progress(reporter.sender())
                    .write_parallel(factory, range, output)
                    .map(|stats| {
                        let totals = stats.totals();
                        (stats.partitions, totals)
                    }),
                WriteMode::Shared => {
                    let writer = SharedSinkWriter::new(workers).with_progress(reporter.sender());
                    write_atomically(output, |w| writer.write(factory, range, w)).map(|stats| {
                        let totals = stats.totals();
                        (stats.partitions, totals)
                    })
                }
            };
        // every writer (and its senders) is dropped here, so the collector can stop
        let summary = reporter.finish()?;
        let (partitions, totals) = result?;

        let mut stats = ConversionStats {
            source_name: factory.name(),
            mode: self.config.mode,
            workers,
            scans_requested: range.len(),
            scans_written: totals.scans_written,
            scans_skipped: totals.scans_skipped,
            points_written: totals.points_written,
            bytes_written: totals.bytes_written,
            failed_partitions: summary.failed_partitions.len(),
            skipped_scans: totals.skipped,
            partitions,
            metadata_path: None,
            elapsed_seconds: 0.0,
        };
        stats.skipped_scans.sort_unstable();

        if self.config.write_metadata {
            let path = sidecar_path(output);
            extract_metadata(primary.as_mut(), range).write_json(&path)?;
            info!("Wrote metadata to {}", path.display());
            stats.metadata_path = Some(path);
        }

        stats.elapsed_seconds = start.elapsed().as_secs_f64();
        info!("{}", stats);
        Ok(stats)
    }
}
