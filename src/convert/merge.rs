//! Deterministic concatenation of partition sinks into the final artifact.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::format::write_header;

use super::parallel::PartitionSink;
use super::ConversionError;

/// Concatenates partition sinks behind a global header
#[derive(Debug, Clone, Copy, Default)]
pub struct Merger;

impl Merger {
    /// Write the header, then every sink's bytes in the given (worker) order.
    ///
    /// Sinks are consumed: each is released after it has been appended, and
    /// the remaining ones are dropped if an append fails.
    pub fn merge<W, I>(scan_count: i32, sinks: I, output: &mut W) -> Result<u64, ConversionError>
    where
        W: Write,
        I: IntoIterator<Item = PartitionSink>,
    {
        let mut total = write_header(output, scan_count)? as u64;
        for (worker, sink) in sinks.into_iter().enumerate() {
            let copied = sink.copy_into(output)?;
            debug!("Appended partition {} ({} bytes)", worker, copied);
            total += copied;
        }
        output.flush()?;
        Ok(total)
    }

    /// Merge into `path` atomically.
    ///
    /// The artifact is assembled in a temporary file next to `path` and renamed
    /// into place only after every sink was appended; on failure `path` is left
    /// untouched.
    pub fn merge_to_path<P, I>(scan_count: i32, sinks: I, path: P) -> Result<u64, ConversionError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = PartitionSink>,
    {
        write_atomically(path, |writer| Merger::merge(scan_count, sinks, writer))
    }
}

/// Run `write` against a temporary file beside `path`, then rename it to `path`.
///
/// The temporary file is removed if `write` or the rename fails.
pub fn write_atomically<P, T, F>(path: P, write: F) -> Result<T, ConversionError>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<T, ConversionError>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".mzbin-")
        .suffix(".partial")
        .tempfile_in(dir)?;

    let value = {
        let mut writer = BufWriter::new(temp.as_file_mut());
        let value = write(&mut writer)?;
        writer.flush()?;
        value
    };
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| ConversionError::IoError(e.error))?;
    debug!("Wrote {}", path.display());
    Ok(value)
}
