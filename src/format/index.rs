//! Random-access index over an artifact's records.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom};

use super::decoder::decode_record;
use super::types::{ScanClassification, ScanNumber, ScanRecord};
use super::{FormatError, CENTROID_POINT_SIZE, HEADER_SIZE, PROFILE_POINT_SIZE, RECORD_HEADER_SIZE};

/// Location and shape of one record inside an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Byte offset of the record start
    pub offset: u64,
    /// Classification from the type flag
    pub classification: ScanClassification,
    /// Number of points in the record
    pub point_count: usize,
}

/// Scan number to record offset map, built with a single forward pass
#[derive(Debug, Clone, Default)]
pub struct ArtifactIndex {
    declared_scan_count: i32,
    entries: BTreeMap<ScanNumber, IndexEntry>,
    duplicates: usize,
}

impl ArtifactIndex {
    /// Index every record of a seekable artifact stream.
    ///
    /// Point data is skipped rather than decoded. If a scan number occurs more
    /// than once, the first occurrence is kept.
    pub fn build<R: Read + Seek>(reader: &mut R) -> Result<Self, FormatError> {
        reader.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut header)
            .map_err(|_| FormatError::MissingHeader)?;

        let stream_len = reader.seek(SeekFrom::End(0))?;
        let mut offset = HEADER_SIZE as u64;
        reader.seek(SeekFrom::Start(offset))?;

        let mut index = Self {
            declared_scan_count: i32::from_le_bytes(header),
            ..Default::default()
        };

        while offset < stream_len {
            if stream_len - offset < RECORD_HEADER_SIZE as u64 {
                return Err(FormatError::TruncatedRecord {
                    scan_number: 0,
                    offset,
                });
            }
            let mut head = [0u8; RECORD_HEADER_SIZE];
            reader.read_exact(&mut head)?;
            let scan_number = i32::from_le_bytes([head[0], head[1], head[2], head[3]]);
            let classification = ScanClassification::from_type_flag(head[4])?;
            let count = i32::from_le_bytes([head[5], head[6], head[7], head[8]]);
            if count < 0 {
                return Err(FormatError::InvalidPointCount { scan_number, count });
            }
            let point_size = match classification {
                ScanClassification::Centroid => CENTROID_POINT_SIZE,
                ScanClassification::Profile => PROFILE_POINT_SIZE,
            };
            let body = count as u64 * point_size as u64;
            let end = offset + RECORD_HEADER_SIZE as u64 + body;
            if end > stream_len {
                return Err(FormatError::TruncatedRecord {
                    scan_number,
                    offset,
                });
            }

            let entry = IndexEntry {
                offset,
                classification,
                point_count: count as usize,
            };
            match index.entries.entry(scan_number) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(_) => index.duplicates += 1,
            }

            reader.seek(SeekFrom::Start(end))?;
            offset = end;
        }

        Ok(index)
    }

    /// Scan count declared in the header
    pub fn declared_scan_count(&self) -> i32 {
        self.declared_scan_count
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the artifact holds no records
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records whose scan number was already indexed
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Entry for a scan number
    pub fn get(&self, scan_number: ScanNumber) -> Option<&IndexEntry> {
        self.entries.get(&scan_number)
    }

    /// Lowest and highest indexed scan numbers
    pub fn bounds(&self) -> Option<(ScanNumber, ScanNumber)> {
        let first = *self.entries.keys().next()?;
        let last = *self.entries.keys().next_back()?;
        Some((first, last))
    }

    /// Indexed scan numbers in increasing order
    pub fn scan_numbers(&self) -> impl Iterator<Item = ScanNumber> + '_ {
        self.entries.keys().copied()
    }

    /// Seek to and decode the record for `scan_number`
    pub fn read_record<R: Read + Seek>(
        &self,
        reader: &mut R,
        scan_number: ScanNumber,
    ) -> Result<Option<ScanRecord>, FormatError> {
        let Some(entry) = self.entries.get(&scan_number) else {
            return Ok(None);
        };
        reader.seek(SeekFrom::Start(entry.offset))?;
        Ok(decode_record(reader, entry.offset)?.map(|(record, _)| record))
    }
}
