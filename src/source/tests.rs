use std::io::Write;

use tempfile::tempdir;

use super::*;
use crate::format::{write_header, write_record};

fn small_source() -> MemorySource {
    MemorySource::builder()
        .profile_scan(1, &[(100.0, 10.0), (100.5, 20.0)])
        .centroid_scan(2, &[(200.0, 5.0, 2)])
        .failing_scan(3, "bad checksum")
        .profile_scan(4, &[])
        .build()
        .unwrap()
}

#[test]
fn test_memory_source_range_from_scans() {
    let source = small_source();
    assert_eq!(source.scan_range(), ScanRange::new(1, 4).unwrap());
    let accessor = source.create_accessor().unwrap();
    assert_eq!(accessor.scan_range().len(), 4);
}

#[test]
fn test_read_payload_matches_classification() {
    let source = small_source();
    let mut accessor = source.create_accessor().unwrap();

    let payload = read_payload(accessor.as_mut(), 1).unwrap();
    assert_eq!(payload.classification(), ScanClassification::Profile);
    assert_eq!(payload.len(), 2);

    let payload = read_payload(accessor.as_mut(), 2).unwrap();
    assert_eq!(
        payload,
        ScanPayload::Centroid(vec![CentroidPoint::new(200.0, 5.0, 2)])
    );

    let payload = read_payload(accessor.as_mut(), 4).unwrap();
    assert!(payload.is_empty());
}

#[test]
fn test_failing_scan_and_out_of_range() {
    let source = small_source();
    let mut accessor = source.create_accessor().unwrap();

    let err = read_payload(accessor.as_mut(), 3).unwrap_err();
    assert!(matches!(err, RetrievalError::Corrupt { scan: 3, .. }));
    assert_eq!(err.scan(), 3);

    let err = read_payload(accessor.as_mut(), 9).unwrap_err();
    assert!(matches!(err, RetrievalError::ScanOutOfRange { scan: 9, .. }));
}

#[test]
fn test_wrong_array_kind_is_unsupported() {
    let source = small_source();
    let mut accessor = source.create_accessor().unwrap();
    assert!(matches!(
        accessor.centroid_points(1),
        Err(RetrievalError::Unsupported { scan: 1, .. })
    ));
    assert!(matches!(
        accessor.profile_points(2),
        Err(RetrievalError::Unsupported { scan: 2, .. })
    ));
}

#[test]
fn test_failing_accessor_creation() {
    let source = MemorySource::builder()
        .profile_scan(1, &[(1.0, 1.0)])
        .failing_accessor(1)
        .build()
        .unwrap();

    assert!(source.create_accessor().is_ok());
    assert!(matches!(
        source.create_accessor(),
        Err(SourceError::ReaderUnavailable(_))
    ));
    assert!(source.create_accessor().is_ok());
    assert_eq!(source.accessors_created(), 3);
}

#[test]
fn test_empty_builder_is_rejected() {
    assert!(matches!(
        MemorySource::builder().build(),
        Err(SourceError::Corrupt(_))
    ));
}

#[test]
fn test_default_metadata_capabilities_are_unsupported() {
    let source = small_source();
    let mut accessor = source.create_accessor().unwrap();
    assert!(matches!(
        accessor.run_info(),
        Err(RetrievalError::Unsupported { .. })
    ));
    assert!(matches!(
        accessor.scan_detail(1),
        Err(RetrievalError::Unsupported { scan: 1, .. })
    ));
}

#[test]
fn test_synthetic_source_cycles_ms_orders() {
    let source = MemorySource::synthetic(12, 8).unwrap();
    let mut accessor = source.create_accessor().unwrap();

    assert_eq!(accessor.classification(1).unwrap(), ScanClassification::Profile);
    assert_eq!(accessor.classification(2).unwrap(), ScanClassification::Centroid);
    assert_eq!(accessor.classification(6).unwrap(), ScanClassification::Profile);

    let ms1 = accessor.scan_detail(6).unwrap();
    assert_eq!(ms1.ms_order, 1);
    assert_eq!(ms1.dependents.as_ref().unwrap().count, 4);

    let ms2 = accessor.scan_detail(8).unwrap();
    assert_eq!(ms2.ms_order, 2);
    assert_eq!(ms2.master_scan(), 6);

    // last MS1 at scan 11 is followed by a single MS2
    let last_ms1 = accessor.scan_detail(11).unwrap();
    assert_eq!(last_ms1.dependents.unwrap().count, 1);

    assert_eq!(accessor.run_info().unwrap().general.last_scan, 12);
}

#[test]
fn test_artifact_source_reads_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.bin");
    let mut file = std::fs::File::create(&path).unwrap();
    let mut bytes = Vec::new();
    write_header(&mut bytes, 4).unwrap();
    write_record(
        &mut bytes,
        2,
        &ScanPayload::Profile(vec![ProfilePoint::new(1.0, 2.0)]),
    )
    .unwrap();
    write_record(
        &mut bytes,
        4,
        &ScanPayload::Centroid(vec![CentroidPoint::new(3.0, 4.0, 1)]),
    )
    .unwrap();
    file.write_all(&bytes).unwrap();
    drop(file);

    let source = open_source(&path).unwrap();
    assert_eq!(source.name(), "run.bin");
    let mut accessor = source.create_accessor().unwrap();
    assert_eq!(accessor.scan_range(), ScanRange::new(2, 4).unwrap());

    assert_eq!(
        read_payload(accessor.as_mut(), 4).unwrap(),
        ScanPayload::Centroid(vec![CentroidPoint::new(3.0, 4.0, 1)])
    );
    assert!(matches!(
        read_payload(accessor.as_mut(), 3),
        Err(RetrievalError::Read { scan: 3, .. })
    ));

    let detail = accessor.scan_detail(2).unwrap();
    assert_eq!(detail.ms_order, 0);
}

#[test]
fn test_artifact_source_rejects_header_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    std::fs::write(&path, 3i32.to_le_bytes()).unwrap();
    assert!(matches!(
        ArtifactSource::open(&path),
        Err(SourceError::Corrupt(_))
    ));
}

#[test]
fn test_open_source_dispatch() {
    let dir = tempdir().unwrap();

    let missing = dir.path().join("missing.raw");
    assert!(matches!(open_source(&missing), Err(SourceError::NotFound(_))));

    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "hello").unwrap();
    assert!(matches!(
        open_source(&text),
        Err(SourceError::UnsupportedFormat(_))
    ));

    assert!(is_supported_source(std::path::Path::new("a.RAW")));
    assert!(is_supported_source(std::path::Path::new("a.bin")));
    assert!(!is_supported_source(std::path::Path::new("a.mzML")));
}

#[cfg(not(feature = "thermo"))]
#[test]
fn test_raw_without_thermo_feature() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("sample.raw");
    std::fs::write(&raw, b"not really a raw file").unwrap();
    assert!(matches!(
        open_source(&raw),
        Err(SourceError::ReaderUnavailable(_))
    ));
}
