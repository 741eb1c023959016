//! Progress reporting from workers to a collector thread.
//!
//! ```text
//! ┌──────────┐
//! │ Worker 0 │──┐
//! │ Worker 1 │──┼──▶ unbounded channel ──▶ collector thread ──▶ log
//! │ Worker N │──┘                          (progress, skips)
//! └──────────┘
//! ```
//!
//! Workers never block on reporting. Skips and partition failures are logged
//! as they arrive; the collector returns a summary when every sender is gone.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};

use crate::format::ScanNumber;

use super::scan::ScanOutcome;
use super::ConversionError;

/// Event sent from a writer to the collector
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// One scan was processed
    Scan {
        /// Worker that processed the scan
        worker: usize,
        /// What happened
        outcome: ScanOutcome,
    },
    /// A worker could not start its partition
    PartitionFailed {
        /// Worker index
        worker: usize,
        /// Setup failure
        reason: String,
    },
    /// A worker finished its partition
    PartitionFinished {
        /// Worker index
        worker: usize,
        /// Records written by the worker
        written: usize,
        /// Scans skipped by the worker
        skipped: usize,
    },
}

/// Cloneable handle workers use to report events
#[derive(Debug, Clone)]
pub struct ProgressSender {
    sender: Sender<ProgressEvent>,
    worker: usize,
}

impl ProgressSender {
    /// Handle tagging events with `worker`
    pub fn for_worker(&self, worker: usize) -> Self {
        Self {
            sender: self.sender.clone(),
            worker,
        }
    }

    /// Worker index attached to events
    pub fn worker(&self) -> usize {
        self.worker
    }

    // A closed channel only means nobody is listening; reporting stays best effort.
    fn send(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }

    /// Report a processed scan
    pub fn scan(&self, outcome: &ScanOutcome) {
        self.send(ProgressEvent::Scan {
            worker: self.worker,
            outcome: outcome.clone(),
        });
    }

    /// Report that this worker could not start
    pub fn partition_failed(&self, reason: impl Into<String>) {
        self.send(ProgressEvent::PartitionFailed {
            worker: self.worker,
            reason: reason.into(),
        });
    }

    /// Report that this worker finished
    pub fn partition_finished(&self, written: usize, skipped: usize) {
        self.send(ProgressEvent::PartitionFinished {
            worker: self.worker,
            written,
            skipped,
        });
    }
}

/// What the collector saw during a run
#[derive(Debug, Clone, Default)]
pub struct ProgressSummary {
    /// Scans processed (written or skipped)
    pub processed: usize,
    /// Records written
    pub written: usize,
    /// Skipped scans with their reasons, in arrival order
    pub skipped: Vec<(ScanNumber, String)>,
    /// Workers that could not start, with their reasons
    pub failed_partitions: Vec<(usize, String)>,
}

/// Collector thread logging progress as events arrive
pub struct ProgressReporter {
    sender: Option<Sender<ProgressEvent>>,
    handle: Option<JoinHandle<ProgressSummary>>,
}

impl ProgressReporter {
    /// Spawn the collector.
    ///
    /// Progress is logged every `interval` processed scans (0 disables
    /// periodic progress lines; skips are always logged).
    pub fn start(total_scans: usize, interval: usize) -> Result<Self, ConversionError> {
        let (sender, receiver) = unbounded::<ProgressEvent>();
        let handle = thread::Builder::new()
            .name("mzbin-progress".to_string())
            .spawn(move || collect(receiver, total_scans, interval))
            .map_err(|e| {
                ConversionError::ReporterError(format!("Failed to spawn progress thread: {}", e))
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Sender for worker 0; use [`ProgressSender::for_worker`] for the others
    pub fn sender(&self) -> Option<ProgressSender> {
        self.sender.as_ref().map(|sender| ProgressSender {
            sender: sender.clone(),
            worker: 0,
        })
    }

    /// Close the channel and wait for the collector.
    ///
    /// Every [`ProgressSender`] must be dropped first, otherwise this blocks.
    pub fn finish(mut self) -> Result<ProgressSummary, ConversionError> {
        self.sender.take();
        let handle = self.handle.take().ok_or_else(|| {
            ConversionError::ReporterError("finish() called twice".to_string())
        })?;
        handle
            .join()
            .map_err(|_| ConversionError::ReporterError("progress thread panicked".to_string()))
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn collect(receiver: Receiver<ProgressEvent>, total: usize, interval: usize) -> ProgressSummary {
    let mut summary = ProgressSummary::default();
    for event in receiver {
        match event {
            ProgressEvent::Scan { worker, outcome } => {
                summary.processed += 1;
                match outcome {
                    ScanOutcome::Written { .. } => summary.written += 1,
                    ScanOutcome::Skipped { scan, reason } => {
                        warn!("Worker {}: skipping scan {}: {}", worker, scan, reason);
                        summary.skipped.push((scan, reason.to_string()));
                    }
                }
                if interval > 0 && summary.processed % interval == 0 {
                    info!(
                        "Processed {}/{} scans ({:.1}%)",
                        summary.processed,
                        total,
                        summary.processed as f64 * 100.0 / total.max(1) as f64
                    );
                }
            }
            ProgressEvent::PartitionFailed { worker, reason } => {
                warn!(
                    "Worker {} could not start; its partition contributes no records: {}",
                    worker, reason
                );
                summary.failed_partitions.push((worker, reason));
            }
            ProgressEvent::PartitionFinished {
                worker,
                written,
                skipped,
            } => {
                debug!(
                    "Worker {} finished: {} written, {} skipped",
                    worker, written, skipped
                );
            }
        }
    }
    summary
}
