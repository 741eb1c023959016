//! Parallel writer appending to a single lock-guarded sink.
//!
//! Workers encode each scan into a local buffer and append it while holding
//! the sink's mutex. Records of one partition stay in scan order, but records
//! of different partitions interleave in lock acquisition order, so the output
//! is NOT globally scan-ordered. Readers must not assume increasing scan
//! numbers; [`super::PartitionedWriter`] is the order-preserving mode.

use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::format::{write_header, ScanRange};
use crate::source::SourceFactory;

use super::parallel::{build_pool, ParallelStats, PartitionStats};
use super::partition::{partition_range, Partition};
use super::report::ProgressSender;
use super::scan::{ScanWriter, WriteStats};
use super::ConversionError;

/// Parallel writer sharing one mutex-guarded output stream
#[derive(Debug, Clone)]
pub struct SharedSinkWriter {
    workers: usize,
    progress: Option<ProgressSender>,
}

impl SharedSinkWriter {
    /// Writer with `workers` partitions
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            progress: None,
        }
    }

    /// Send per-scan outcomes to a progress collector
    pub fn with_progress(mut self, progress: Option<ProgressSender>) -> Self {
        self.progress = progress;
        self
    }

    /// Write the header, then let all workers append records to `output`
    pub fn write<W: Write + Send>(
        &self,
        factory: &dyn SourceFactory,
        range: ScanRange,
        output: &mut W,
    ) -> Result<ParallelStats, ConversionError> {
        let start = Instant::now();
        let pool = build_pool(self.workers)?;
        let header_bytes = write_header(output, range.header_count())? as u64;
        let partitions = partition_range(range, self.workers);
        info!(
            "Writing scans {} of {} with {} workers into a shared sink (unordered)",
            range,
            factory.name(),
            partitions.len()
        );

        let sink = Mutex::new(output);
        let results: Vec<Result<PartitionStats, ConversionError>> = pool.install(|| {
            partitions
                .into_par_iter()
                .map(|partition| self.run_partition(factory, partition, &sink))
                .collect()
        });
        let partitions = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        // a panicking worker resurfaces from `pool.install`, so poison never reaches here
        let output = sink.into_inner().unwrap_or_else(PoisonError::into_inner);
        output.flush()?;

        let record_bytes: u64 = partitions.iter().map(|p| p.write.bytes_written).sum();
        Ok(ParallelStats {
            partitions,
            bytes_written: header_bytes + record_bytes,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    fn run_partition<W: Write + Send>(
        &self,
        factory: &dyn SourceFactory,
        partition: Partition,
        sink: &Mutex<&mut W>,
    ) -> Result<PartitionStats, ConversionError> {
        let progress = self
            .progress
            .as_ref()
            .map(|p| p.for_worker(partition.worker_index));
        let mut stats = PartitionStats {
            partition,
            write: WriteStats::default(),
            setup_error: None,
        };
        if partition.is_empty() {
            return Ok(stats);
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
                return Ok(stats);
            }
        };

        let mut writer = ScanWriter::new(accessor.as_mut()).with_progress(progress.clone());
        let mut buffer = Vec::new();
        for scan in partition.scans() {
            buffer.clear();
            if writer.write_scan(scan, &mut buffer)?.is_written() {
                let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
                guard.write_all(&buffer)?;
            }
        }
        stats.write = writer.finish();

        if let Some(progress) = &progress {
            progress.partition_finished(stats.write.scans_written, stats.write.scans_skipped);
        }
        debug!("{}: {}", partition, stats.write);
        Ok(stats)
    }
}
