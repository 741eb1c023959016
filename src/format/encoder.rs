//! Record encoder for the scan artifact format.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::types::{ScanNumber, ScanPayload};
use super::{FormatError, CENTROID_POINT_SIZE, HEADER_SIZE, PROFILE_POINT_SIZE, RECORD_HEADER_SIZE};

/// Encoded size in bytes of a record holding `payload`
pub fn encoded_len(payload: &ScanPayload) -> usize {
    let point_size = match payload {
        ScanPayload::Centroid(_) => CENTROID_POINT_SIZE,
        ScanPayload::Profile(_) => PROFILE_POINT_SIZE,
    };
    RECORD_HEADER_SIZE + payload.len() * point_size
}

/// Encode a single scan into its on-disk record.
///
/// An empty payload produces the 9-byte record header only.
pub fn encode_record(scan_number: ScanNumber, payload: &ScanPayload) -> Result<Vec<u8>, FormatError> {
    let mut buffer = Vec::with_capacity(encoded_len(payload));
    write_record(&mut buffer, scan_number, payload)?;
    Ok(buffer)
}

/// Append a single encoded record to `writer`, returning the number of bytes written
pub fn write_record<W: Write>(
    writer: &mut W,
    scan_number: ScanNumber,
    payload: &ScanPayload,
) -> Result<usize, FormatError> {
    let count = i32::try_from(payload.len()).map_err(|_| FormatError::PayloadTooLarge {
        scan_number,
        count: payload.len(),
    })?;

    writer.write_i32::<LittleEndian>(scan_number)?;
    writer.write_u8(payload.classification().type_flag())?;
    writer.write_i32::<LittleEndian>(count)?;

    match payload {
        ScanPayload::Centroid(points) => {
            for point in points {
                writer.write_f64::<LittleEndian>(point.mass)?;
                writer.write_f64::<LittleEndian>(point.intensity)?;
                writer.write_i32::<LittleEndian>(point.charge)?;
            }
        }
        ScanPayload::Profile(points) => {
            for point in points {
                writer.write_f64::<LittleEndian>(point.mass)?;
                writer.write_f64::<LittleEndian>(point.intensity)?;
            }
        }
    }

    Ok(encoded_len(payload))
}

/// Write the global scan-count header
pub fn write_header<W: Write>(writer: &mut W, scan_count: i32) -> Result<usize, FormatError> {
    writer.write_i32::<LittleEndian>(scan_count)?;
    Ok(HEADER_SIZE)
}
