//! Single-threaded artifact writer.

use std::io::Write;

use log::debug;

use crate::format::{write_header, ScanRange};
use crate::source::ScanAccessor;

use super::report::ProgressSender;
use super::scan::{ScanWriter, WriteStats};
use super::ConversionError;

/// Writes a whole scan range in increasing order into one stream
#[derive(Debug, Clone, Default)]
pub struct SequentialWriter {
    progress: Option<ProgressSender>,
}

impl SequentialWriter {
    /// Create a sequential writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Send per-scan outcomes to a progress collector
    pub fn with_progress(mut self, progress: Option<ProgressSender>) -> Self {
        self.progress = progress;
        self
    }

    /// Write the header and one record per readable scan of `range`.
    ///
    /// Unreadable scans are skipped; sink I/O errors abort the write.
    pub fn write<W: Write>(
        &self,
        accessor: &mut dyn ScanAccessor,
        range: ScanRange,
        output: &mut W,
    ) -> Result<WriteStats, ConversionError> {
        let header_bytes = write_header(output, range.header_count())?;

        let mut writer = ScanWriter::new(accessor).with_progress(self.progress.clone());
        writer.write_scans(range.iter(), output)?;
        output.flush()?;

        let mut stats = writer.finish();
        stats.bytes_written += header_bytes as u64;
        debug!("Sequential write of scans {}: {}", range, stats);
        Ok(stats)
    }
}
