#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use mzbin::format::{encode_record, ArtifactIndex, ArtifactReader};

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must fail cleanly, never panic
    if let Ok(reader) = ArtifactReader::new(Cursor::new(data)) {
        for record in reader.take(10_000) {
            match record {
                Ok(record) => {
                    // Every decoded record re-encodes
                    let _ = encode_record(record.scan_number, &record.payload);
                }
                Err(_) => break,
            }
        }
    }

    // The index walks the same bytes by seeking over payloads
    let mut cursor = Cursor::new(data);
    if let Ok(index) = ArtifactIndex::build(&mut cursor) {
        let scans: Vec<_> = index.scan_numbers().take(100).collect();
        for scan in scans {
            let _ = index.read_record(&mut cursor, scan);
        }
    }
});
