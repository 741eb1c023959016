//! Streaming decoder for scan artifacts.
//!
//! The header's scan count reflects the *requested* scan range, so readers
//! consume records until end-of-stream rather than trusting the count.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::types::{CentroidPoint, ProfilePoint, ScanClassification, ScanPayload, ScanRecord};
use super::{FormatError, HEADER_SIZE, RECORD_HEADER_SIZE};

/// Upper bound on points pre-allocated from an untrusted count
const MAX_PREALLOCATED_POINTS: usize = 1 << 16;

/// Fill `buf` completely, or report how many bytes were available before EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Sequential reader over an artifact stream
pub struct ArtifactReader<R: Read> {
    reader: R,
    declared_scan_count: i32,
    offset: u64,
    finished: bool,
}

impl ArtifactReader<BufReader<File>> {
    /// Open an artifact file and read its header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> ArtifactReader<R> {
    /// Wrap a stream positioned at the start of an artifact and read its header
    pub fn new(mut reader: R) -> Result<Self, FormatError> {
        let mut header = [0u8; HEADER_SIZE];
        if read_full(&mut reader, &mut header)? < HEADER_SIZE {
            return Err(FormatError::MissingHeader);
        }
        Ok(Self {
            reader,
            declared_scan_count: i32::from_le_bytes(header),
            offset: HEADER_SIZE as u64,
            finished: false,
        })
    }

    /// Scan count declared in the header (requested range size)
    pub fn declared_scan_count(&self) -> i32 {
        self.declared_scan_count
    }

    /// Byte offset of the next record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next record; `Ok(None)` at a clean end-of-stream
    pub fn next_record(&mut self) -> Result<Option<ScanRecord>, FormatError> {
        if self.finished {
            return Ok(None);
        }
        match decode_record(&mut self.reader, self.offset) {
            Ok(Some((record, len))) => {
                self.offset += len as u64;
                Ok(Some(record))
            }
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    /// Consume the reader, returning the wrapped stream
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for ArtifactReader<R> {
    type Item = Result<ScanRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Decode one record starting at `offset`.
///
/// Returns `Ok(None)` if the stream ends exactly at the record boundary,
/// otherwise the record together with its encoded length.
pub fn decode_record<R: Read>(
    reader: &mut R,
    offset: u64,
) -> Result<Option<(ScanRecord, usize)>, FormatError> {
    let mut head = [0u8; RECORD_HEADER_SIZE];
    let available = read_full(reader, &mut head)?;
    if available == 0 {
        return Ok(None);
    }
    let scan_number = if available >= 4 {
        i32::from_le_bytes([head[0], head[1], head[2], head[3]])
    } else {
        0
    };
    if available < RECORD_HEADER_SIZE {
        return Err(FormatError::TruncatedRecord {
            scan_number,
            offset,
        });
    }

    let classification = ScanClassification::from_type_flag(head[4])?;
    let count = i32::from_le_bytes([head[5], head[6], head[7], head[8]]);
    if count < 0 {
        return Err(FormatError::InvalidPointCount { scan_number, count });
    }
    let count = count as usize;

    let truncated = |e: io::Error| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::TruncatedRecord {
                scan_number,
                offset,
            }
        } else {
            FormatError::IoError(e)
        }
    };

    let payload = match classification {
        ScanClassification::Centroid => {
            let mut points = Vec::with_capacity(count.min(MAX_PREALLOCATED_POINTS));
            for _ in 0..count {
                let mass = reader.read_f64::<LittleEndian>().map_err(truncated)?;
                let intensity = reader.read_f64::<LittleEndian>().map_err(truncated)?;
                let charge = reader.read_i32::<LittleEndian>().map_err(truncated)?;
                points.push(CentroidPoint::new(mass, intensity, charge));
            }
            ScanPayload::Centroid(points)
        }
        ScanClassification::Profile => {
            let mut points = Vec::with_capacity(count.min(MAX_PREALLOCATED_POINTS));
            for _ in 0..count {
                let mass = reader.read_f64::<LittleEndian>().map_err(truncated)?;
                let intensity = reader.read_f64::<LittleEndian>().map_err(truncated)?;
                points.push(ProfilePoint::new(mass, intensity));
            }
            ScanPayload::Profile(points)
        }
    };

    let len = super::encoded_len(&payload);
    Ok(Some((ScanRecord::new(scan_number, payload), len)))
}

/// A fully decoded artifact
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Scan count declared in the header
    pub declared_scan_count: i32,
    /// Records in stream order
    pub records: Vec<ScanRecord>,
}

impl Artifact {
    /// Decode a complete artifact from an in-memory buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::from_reader(ArtifactReader::new(bytes)?)
    }

    /// Drain `reader` to end-of-stream
    fn from_reader<R: Read>(reader: ArtifactReader<R>) -> Result<Self, FormatError> {
        let declared_scan_count = reader.declared_scan_count();
        let records = reader.collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            declared_scan_count,
            records,
        })
    }

    /// Scan numbers in stream order
    pub fn scan_numbers(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.scan_number).collect()
    }
}

/// Decode a complete artifact file into memory
pub fn read_artifact<P: AsRef<Path>>(path: P) -> Result<Artifact, FormatError> {
    Artifact::from_reader(ArtifactReader::open(path)?)
}
