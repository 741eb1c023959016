//! Partitioned parallel writer with order-preserving merge.
//!
//! ```text
//! ┌───────────────┐     ┌──────────────────┐     ┌──────────┐
//! │ SourceFactory │────▶│ partition_range  │────▶│ Worker 0 │───▶ sink 0 ─┐
//! │   (shared)    │     │ (contiguous)     │     │ Worker 1 │───▶ sink 1 ─┼─▶ Merger ─▶ artifact
//! │               │     │                  │     │ Worker N │───▶ sink N ─┘
//! └───────────────┘     └──────────────────┘     └──────────┘
//! ```
//!
//! Each worker creates its own accessor and writes records without a header
//! into a private sink. Partitions are contiguous and the merger appends the
//! sinks in worker order, so the artifact is in global scan order no matter
//! which worker finishes first.

use std::fmt;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::format::ScanRange;
use crate::source::SourceFactory;

use super::merge::Merger;
use super::partition::{partition_range, Partition};
use super::report::ProgressSender;
use super::scan::{ScanWriter, WriteStats};
use super::ConversionError;

/// Where partition workers buffer their records before the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Named temporary file per partition, deleted after the merge
    #[default]
    File,
    /// In-memory buffer per partition
    Memory,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::File => write!(f, "file"),
            SinkKind::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for SinkKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(SinkKind::File),
            "memory" => Ok(SinkKind::Memory),
            other => Err(ConversionError::InvalidConfig(format!(
                "unknown sink kind '{}', expected 'file' or 'memory'",
                other
            ))),
        }
    }
}

/// Private byte sink of one partition worker
#[derive(Debug)]
pub enum PartitionSink {
    /// Buffered temporary file
    File(BufWriter<NamedTempFile>),
    /// Memory buffer
    Memory(Vec<u8>),
}

impl PartitionSink {
    /// Create an empty sink for `worker`
    pub fn create(kind: SinkKind, temp_dir: Option<&Path>, worker: usize) -> io::Result<Self> {
        match kind {
            SinkKind::File => {
                let prefix = format!("mzbin-part-{:04}-", worker);
                let mut builder = tempfile::Builder::new();
                builder.prefix(&prefix).suffix(".bin");
                let file = match temp_dir {
                    Some(dir) => builder.tempfile_in(dir)?,
                    None => builder.tempfile()?,
                };
                Ok(PartitionSink::File(BufWriter::new(file)))
            }
            SinkKind::Memory => Ok(PartitionSink::Memory(Vec::new())),
        }
    }

    /// Kind of sink
    pub fn kind(&self) -> SinkKind {
        match self {
            PartitionSink::File(_) => SinkKind::File,
            PartitionSink::Memory(_) => SinkKind::Memory,
        }
    }

    /// Path of the backing temporary file, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            PartitionSink::File(writer) => Some(writer.get_ref().path()),
            PartitionSink::Memory(_) => None,
        }
    }

    /// Append the sink's bytes to `output` and release the sink.
    ///
    /// File sinks are deleted when this returns, whether or not the copy succeeded.
    pub fn copy_into<W: Write + ?Sized>(self, output: &mut W) -> io::Result<u64> {
        match self {
            PartitionSink::File(writer) => {
                let mut file = writer.into_inner().map_err(|e| e.into_error())?;
                file.seek(SeekFrom::Start(0))?;
                io::copy(&mut file, output)
            }
            PartitionSink::Memory(buffer) => {
                output.write_all(&buffer)?;
                Ok(buffer.len() as u64)
            }
        }
    }
}

impl Write for PartitionSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            PartitionSink::File(writer) => writer.write(buf),
            PartitionSink::Memory(buffer) => buffer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            PartitionSink::File(writer) => writer.flush(),
            PartitionSink::Memory(_) => Ok(()),
        }
    }
}

/// Outcome of one partition worker
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    /// The partition the worker processed
    pub partition: Partition,
    /// Counters of the worker's write loop (record bytes only)
    pub write: WriteStats,
    /// Accessor creation failure that left the partition empty
    pub setup_error: Option<String>,
}

impl PartitionStats {
    fn new(partition: Partition) -> Self {
        Self {
            partition,
            write: WriteStats::default(),
            setup_error: None,
        }
    }

    /// Whether the worker failed to start
    pub fn failed(&self) -> bool {
        self.setup_error.is_some()
    }
}

/// Statistics of a parallel write
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParallelStats {
    /// Per-partition statistics in worker order
    pub partitions: Vec<PartitionStats>,
    /// Bytes in the final artifact, header included
    pub bytes_written: u64,
    /// Wall-clock time in seconds
    pub elapsed_seconds: f64,
}

impl ParallelStats {
    /// Counters summed over all partitions
    pub fn totals(&self) -> WriteStats {
        let mut totals = WriteStats::default();
        for partition in &self.partitions {
            totals.merge(&partition.write);
        }
        totals.bytes_written = self.bytes_written;
        totals
    }

    /// Number of partitions whose worker could not start
    pub fn failed_partitions(&self) -> usize {
        self.partitions.iter().filter(|p| p.failed()).count()
    }
}

/// Build the fixed-size worker pool
pub(crate) fn build_pool(workers: usize) -> Result<rayon::ThreadPool, ConversionError> {
    if workers == 0 {
        return Err(ConversionError::InvalidConfig(
            "worker count must be at least 1".to_string(),
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("mzbin-worker-{}", i))
        .build()
        .map_err(|e| ConversionError::ThreadPoolError(e.to_string()))
}

/// Writes partitions concurrently into private sinks, then merges them
#[derive(Debug, Clone)]
pub struct PartitionedWriter {
    workers: usize,
    sink: SinkKind,
    temp_dir: Option<PathBuf>,
    progress: Option<ProgressSender>,
}

impl PartitionedWriter {
    /// Writer with `workers` partitions and file sinks
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            sink: SinkKind::File,
            temp_dir: None,
            progress: None,
        }
    }

    /// Choose the partition sink kind
    pub fn with_sink(mut self, sink: SinkKind) -> Self {
        self.sink = sink;
        self
    }

    /// Directory for temporary partition files (system default otherwise)
    pub fn with_temp_dir(mut self, temp_dir: Option<PathBuf>) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    /// Send per-scan outcomes to a progress collector
    pub fn with_progress(mut self, progress: Option<ProgressSender>) -> Self {
        self.progress = progress;
        self
    }

    /// Number of workers (and partitions)
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run all partitions concurrently and return their sinks in worker order.
    ///
    /// Blocks until every worker is done. A sink I/O error in any worker is
    /// returned after the join; all sinks are dropped in that case.
    pub fn write_partitions(
        &self,
        factory: &dyn SourceFactory,
        range: ScanRange,
    ) -> Result<Vec<(PartitionStats, PartitionSink)>, ConversionError> {
        let pool = build_pool(self.workers)?;
        let partitions = partition_range(range, self.workers);
        info!(
            "Writing scans {} of {} with {} workers ({} sinks)",
            range,
            factory.name(),
            partitions.len(),
            self.sink
        );

        let results: Vec<Result<(PartitionStats, PartitionSink), ConversionError>> =
            pool.install(|| {
                partitions
                    .into_par_iter()
                    .map(|partition| self.run_partition(factory, partition))
                    .collect()
            });

        results.into_iter().collect()
    }

    /// Write `range` in parallel and merge into `output_path` atomically
    pub fn write_parallel<P: AsRef<Path>>(
        &self,
        factory: &dyn SourceFactory,
        range: ScanRange,
        output_path: P,
    ) -> Result<ParallelStats, ConversionError> {
        let start = Instant::now();
        let (partitions, sinks): (Vec<_>, Vec<_>) =
            self.write_partitions(factory, range)?.into_iter().unzip();
        let bytes_written = Merger::merge_to_path(range.header_count(), sinks, output_path)?;
        Ok(ParallelStats {
            partitions,
            bytes_written,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    /// Write `range` in parallel and merge into `output`
    pub fn write_parallel_to<W: Write>(
        &self,
        factory: &dyn SourceFactory,
        range: ScanRange,
        output: &mut W,
    ) -> Result<ParallelStats, ConversionError> {
        let start = Instant::now();
        let (partitions, sinks): (Vec<_>, Vec<_>) =
            self.write_partitions(factory, range)?.into_iter().unzip();
        let bytes_written = Merger::merge(range.header_count(), sinks, output)?;
        Ok(ParallelStats {
            partitions,
            bytes_written,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    fn run_partition(
        &self,
        factory: &dyn SourceFactory,
        partition: Partition,
    ) -> Result<(PartitionStats, PartitionSink), ConversionError> {
        let progress = self
            .progress
            .as_ref()
            .map(|p| p.for_worker(partition.worker_index));
        let mut sink =
            PartitionSink::create(self.sink, self.temp_dir.as_deref(), partition.worker_index)?;
        let mut stats = PartitionStats::new(partition);

        if partition.is_empty() {
            debug!("{}: nothing to write", partition);
            return Ok((stats, sink));
        }

        let mut accessor = match factory.create_accessor() {
            Ok(accessor) => accessor,
            Err(e) => {
                match &progress {
                    Some(progress) => progress.partition_failed(e.to_string()),
                    None => warn!(
                        "{} could not create an accessor; its partition contributes no records: {}",
                        partition, e
                    ),
                }
                stats.setup_error = Some(e.to_string());
                return Ok((stats, sink));
            }
        };

        let mut writer = ScanWriter::new(accessor.as_mut()).with_progress(progress.clone());
        writer.write_scans(partition.scans(), &mut sink)?;
        sink.flush()?;
        stats.write = writer.finish();

        if let Some(progress) = &progress {
            progress.partition_finished(stats.write.scans_written, stats.write.scans_skipped);
        }
        debug!("{}: {}", partition, stats.write);
        Ok((stats, sink))
    }
}
