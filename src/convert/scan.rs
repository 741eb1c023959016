//! Per-scan write loop shared by every writer.

use std::fmt;
use std::io::Write;

use log::warn;
use serde::Serialize;

use crate::format::{write_record, FormatError, ScanClassification, ScanNumber};
use crate::source::{read_payload, RetrievalError, ScanAccessor};

use super::report::ProgressSender;

/// Result of processing one scan
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// A record was appended to the sink
    Written {
        /// Scan number
        scan: ScanNumber,
        /// Classification of the record
        classification: ScanClassification,
        /// Number of points in the record
        points: usize,
        /// Encoded record size in bytes
        bytes: usize,
    },
    /// The scan could not be read and was left out
    Skipped {
        /// Scan number
        scan: ScanNumber,
        /// Why retrieval failed
        reason: RetrievalError,
    },
}

impl ScanOutcome {
    /// Scan number the outcome refers to
    pub fn scan(&self) -> ScanNumber {
        match self {
            ScanOutcome::Written { scan, .. } | ScanOutcome::Skipped { scan, .. } => *scan,
        }
    }

    /// Whether a record was written
    pub fn is_written(&self) -> bool {
        matches!(self, ScanOutcome::Written { .. })
    }

    /// Bytes appended to the sink (0 for skipped scans)
    pub fn bytes(&self) -> usize {
        match self {
            ScanOutcome::Written { bytes, .. } => *bytes,
            ScanOutcome::Skipped { .. } => 0,
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanOutcome::Written {
                scan,
                classification,
                points,
                bytes,
            } => write!(
                f,
                "scan {}: {} points ({}), {} bytes",
                scan, points, classification, bytes
            ),
            ScanOutcome::Skipped { reason, .. } => write!(f, "skipped: {}", reason),
        }
    }
}

/// Counters for one write loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    /// Records written
    pub scans_written: usize,
    /// Scans skipped after a retrieval failure
    pub scans_skipped: usize,
    /// Points across all written records
    pub points_written: usize,
    /// Bytes written, including the header when the loop wrote one
    pub bytes_written: u64,
    /// Skipped scan numbers in processing order
    pub skipped: Vec<ScanNumber>,
}

impl WriteStats {
    /// Fold an outcome into the counters
    pub fn record(&mut self, outcome: &ScanOutcome) {
        match outcome {
            ScanOutcome::Written { points, bytes, .. } => {
                self.scans_written += 1;
                self.points_written += points;
                self.bytes_written += *bytes as u64;
            }
            ScanOutcome::Skipped { scan, .. } => {
                self.scans_skipped += 1;
                self.skipped.push(*scan);
            }
        }
    }

    /// Add another loop's counters to this one
    pub fn merge(&mut self, other: &WriteStats) {
        self.scans_written += other.scans_written;
        self.scans_skipped += other.scans_skipped;
        self.points_written += other.points_written;
        self.bytes_written += other.bytes_written;
        self.skipped.extend_from_slice(&other.skipped);
    }
}

impl fmt::Display for WriteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} scans ({} points, {} bytes), skipped {}",
            self.scans_written, self.points_written, self.bytes_written, self.scans_skipped
        )
    }
}

/// Fetch, encode, and append scans through one exclusively owned accessor.
///
/// Retrieval failures become [`ScanOutcome::Skipped`]; only sink I/O errors
/// are returned as errors.
pub struct ScanWriter<'a> {
    accessor: &'a mut dyn ScanAccessor,
    progress: Option<ProgressSender>,
    stats: WriteStats,
}

impl<'a> ScanWriter<'a> {
    /// Create a write loop over `accessor`
    pub fn new(accessor: &'a mut dyn ScanAccessor) -> Self {
        Self {
            accessor,
            progress: None,
            stats: WriteStats::default(),
        }
    }

    /// Report outcomes to a progress collector instead of logging skips directly
    pub fn with_progress(mut self, progress: Option<ProgressSender>) -> Self {
        self.progress = progress;
        self
    }

    /// Process one scan, appending its record to `sink` on success
    pub fn write_scan<W: Write>(
        &mut self,
        scan: ScanNumber,
        sink: &mut W,
    ) -> Result<ScanOutcome, FormatError> {
        let outcome = match read_payload(&mut *self.accessor, scan) {
            Ok(payload) => {
                let bytes = write_record(sink, scan, &payload)?;
                ScanOutcome::Written {
                    scan,
                    classification: payload.classification(),
                    points: payload.len(),
                    bytes,
                }
            }
            Err(reason) => ScanOutcome::Skipped { scan, reason },
        };

        self.stats.record(&outcome);
        match &self.progress {
            Some(progress) => progress.scan(&outcome),
            None => {
                if let ScanOutcome::Skipped { scan, reason } = &outcome {
                    warn!("Skipping scan {}: {}", scan, reason);
                }
            }
        }
        Ok(outcome)
    }

    /// Process scans in increasing order
    pub fn write_scans<W, I>(&mut self, scans: I, sink: &mut W) -> Result<(), FormatError>
    where
        W: Write,
        I: IntoIterator<Item = ScanNumber>,
    {
        for scan in scans {
            self.write_scan(scan, sink)?;
        }
        Ok(())
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> &WriteStats {
        &self.stats
    }

    /// Finish the loop and return its counters
    pub fn finish(self) -> WriteStats {
        self.stats
    }
}
