//! Contiguous partitioning of a scan range across workers.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::format::{ScanNumber, ScanRange};

/// Contiguous, possibly empty, sub-range of scans assigned to one worker.
///
/// Bounds are inclusive; an empty partition has `end_scan == start_scan - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Worker index, equal to the partition's position in range order
    pub worker_index: usize,
    /// First scan (inclusive)
    pub start_scan: ScanNumber,
    /// Last scan (inclusive)
    pub end_scan: ScanNumber,
}

impl Partition {
    /// Number of scans in the partition
    pub fn len(&self) -> usize {
        (self.end_scan as i64 - self.start_scan as i64 + 1).max(0) as usize
    }

    /// Whether the partition holds no scans
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scan numbers in increasing order
    pub fn scans(&self) -> RangeInclusive<ScanNumber> {
        self.start_scan..=self.end_scan
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "worker {} [empty]", self.worker_index)
        } else {
            write!(
                f,
                "worker {} [{}-{}]",
                self.worker_index, self.start_scan, self.end_scan
            )
        }
    }
}

/// Split `range` into `workers` contiguous partitions.
///
/// Every worker gets `N / W` scans and the last worker also takes the
/// remainder `N mod W`. When `N < W` the leading partitions are empty.
/// A worker count of 0 is treated as 1.
pub fn partition_range(range: ScanRange, workers: usize) -> Vec<Partition> {
    let workers = workers.max(1);
    let total = range.len() as i64;
    let base = total / workers as i64;
    let remainder = total % workers as i64;
    let first = range.first() as i64;

    (0..workers)
        .map(|worker_index| {
            let start = first + worker_index as i64 * base;
            let mut end = start + base - 1;
            if worker_index == workers - 1 {
                end += remainder;
            }
            // both bounds lie in [first - 1, last], so they fit in an i32
            Partition {
                worker_index,
                start_scan: start as ScanNumber,
                end_scan: end as ScanNumber,
            }
        })
        .collect()
}
