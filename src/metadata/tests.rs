use std::path::Path;

use tempfile::tempdir;

use super::*;
use crate::format::ScanRange;
use crate::source::{MemorySource, SourceFactory};

fn ms2_detail() -> ScanDetail {
    ScanDetail {
        scan_number: 2,
        retention_time: 0.5,
        filter_text: "ITMS + c NSI d Full ms2 445.12@cid35.00".to_string(),
        ms_order: 2,
        ionization_mode: "NSI".to_string(),
        reaction: Some(Reaction {
            precursor_mass: 445.12,
            collision_energy: 35.0,
            isolation_width: 2.0,
            master_scan: Some(1),
            monoisotopic_mz: Some(445.1187),
        }),
        trailer: Vec::new(),
        dependents: None,
    }
}

#[test]
fn test_ms_order_labels() {
    assert_eq!(ms_order_label(0), "Unknown");
    assert_eq!(ms_order_label(1), "Ms");
    assert_eq!(ms_order_label(2), "Ms2");
    assert_eq!(ms_order_label(3), "Ms3");
}

#[test]
fn test_format_ms2_details() {
    let text = format_scan_details(&ms2_detail());
    assert_eq!(
        text,
        "Scan number 2 @ time 0.50 - Master scan = 1, Ionization mode = NSI, MS Order = Ms2, \
         Precursor mass = 445.1200, Monoisotopic Mass = 445.1187, Collision energy = 35.00, \
         Isolation width = 2.00"
    );
}

#[test]
fn test_format_ms1_details() {
    let mut detail = ScanDetail {
        scan_number: 1,
        retention_time: 0.25,
        ms_order: 1,
        ..Default::default()
    };
    assert_eq!(
        format_scan_details(&detail),
        "Scan number 1 @ time 0.25 - No dependent scans found."
    );

    detail.dependents = Some(DependentScans {
        instrument_type: "ITMS".to_string(),
        count: 10,
    });
    assert_eq!(
        format_scan_details(&detail),
        "Scan number 1 @ time 0.25 - Instrument type = ITMS, Number of dependent scans = 10"
    );
}

#[test]
fn test_format_unknown_order() {
    let detail = ScanDetail {
        scan_number: 9,
        retention_time: 1.0,
        ms_order: 3,
        ..Default::default()
    };
    assert_eq!(
        format_scan_details(&detail),
        "Scan number 9 @ time 1.00 - Unknown MS Order."
    );
}

#[test]
fn test_trailer_values_take_precedence() {
    let mut detail = ms2_detail();
    detail.trailer = vec![
        TrailerEntry::new("Charge State:", "2"),
        TrailerEntry::new("Monoisotopic M/Z:", " 445.1190 "),
        TrailerEntry::new("Master Scan Number", "17"),
    ];
    assert_eq!(detail.master_scan(), 17);
    assert_eq!(detail.monoisotopic_mass(), 445.119);
    assert_eq!(detail.trailer_value(&["Charge State:"]), Some("2"));
}

#[test]
fn test_master_scan_fallbacks() {
    let mut detail = ms2_detail();
    detail.trailer = vec![TrailerEntry::new("Master Index:", "not a number")];
    assert_eq!(detail.master_scan(), 1);

    detail.reaction = None;
    assert_eq!(detail.master_scan(), 0);
    assert_eq!(detail.monoisotopic_mass(), 0.0);
}

#[test]
fn test_scan_metadata_from_detail() {
    let ms2 = ScanMetadata::from(&ms2_detail());
    assert!(ms2.ms1.is_none());
    let attributes = ms2.ms2.unwrap();
    assert_eq!(attributes.master_scan, 1);
    assert_eq!(attributes.order, "Ms2");
    assert_eq!(attributes.ionization_mode, "NSI");
    assert_eq!(attributes.precursor_mass, 445.12);

    let ms1 = ScanMetadata::from(&ScanDetail {
        scan_number: 1,
        ms_order: 1,
        dependents: Some(DependentScans {
            instrument_type: "FTMS".to_string(),
            count: 3,
        }),
        ..Default::default()
    });
    assert_eq!(ms1.ms1.unwrap().num_dependent_scans, 3);
    assert!(ms1.ms2.is_none());
}

#[test]
fn test_extract_metadata_from_synthetic_run() {
    let source = MemorySource::synthetic(12, 2).unwrap();
    let mut accessor = source.create_accessor().unwrap();
    let metadata = extract_metadata(accessor.as_mut(), source.scan_range());

    assert_eq!(metadata.general.instrument_model, "Synthetic Orbitrap");
    assert_eq!(metadata.scans.len(), 12);
    assert_eq!(metadata.converter, "mzbin");
    assert!(metadata.first_scan_filter.as_deref().unwrap().contains("Full ms "));
    assert!(metadata.last_scan_filter.as_deref().unwrap().contains("ms2"));

    let first = &metadata.scans[0];
    assert_eq!(first.ms1.as_ref().unwrap().num_dependent_scans, 4);
    let second = metadata.scans[1].ms2.as_ref().unwrap();
    assert_eq!(second.master_scan, 1);
    assert!((second.monoisotopic_mass - 600.2479).abs() < 1e-9);

    // scan 11 starts the last cycle with a single dependent
    assert_eq!(metadata.scans[10].ms1.as_ref().unwrap().num_dependent_scans, 1);
    // the final MS1 has no dependents left, so no MS1 attributes are recorded
    let source = MemorySource::synthetic(11, 2).unwrap();
    let mut accessor = source.create_accessor().unwrap();
    let metadata = extract_metadata(accessor.as_mut(), source.scan_range());
    assert!(metadata.scans[10].ms1.is_none());
}

#[test]
fn test_extract_metadata_without_details() {
    let source = MemorySource::builder()
        .profile_scan(5, &[(100.0, 1.0)])
        .profile_scan(8, &[(100.0, 1.0)])
        .build()
        .unwrap();
    let mut accessor = source.create_accessor().unwrap();
    let metadata = extract_metadata(accessor.as_mut(), source.scan_range());

    assert_eq!(metadata.general.first_scan, 5);
    assert_eq!(metadata.general.last_scan, 8);
    assert_eq!(metadata.general.number_of_scans, 4);
    assert!(metadata.scans.is_empty());
    assert!(metadata.first_scan_filter.is_none());
}

#[test]
fn test_extract_metadata_skips_missing_detail() {
    let detail = |scan| ScanDetail {
        scan_number: scan,
        ms_order: 1,
        ..Default::default()
    };
    let source = MemorySource::builder()
        .range(1, 3)
        .profile_scan(1, &[])
        .profile_scan(2, &[])
        .profile_scan(3, &[])
        .scan_detail(detail(1))
        .scan_detail(detail(3))
        .build()
        .unwrap();
    let mut accessor = source.create_accessor().unwrap();
    let metadata = extract_metadata(accessor.as_mut(), ScanRange::new(1, 3).unwrap());

    let scans: Vec<_> = metadata.scans.iter().map(|s| s.scan_number).collect();
    assert_eq!(scans, vec![1, 3]);
}

#[test]
fn test_sidecar_path() {
    assert_eq!(
        sidecar_path("out/run.bin"),
        Path::new("out/run.bin.metadata.json")
    );
}

#[test]
fn test_metadata_json_roundtrip() {
    let dir = tempdir().unwrap();
    let source = MemorySource::synthetic(6, 1).unwrap();
    let mut accessor = source.create_accessor().unwrap();
    let metadata = extract_metadata(accessor.as_mut(), source.scan_range());

    let json = metadata.to_json().unwrap();
    assert!(json.contains("\"instrument_model\": \"Synthetic Orbitrap\""));
    let parsed = RunMetadata::from_json(&json).unwrap();
    assert_eq!(parsed.general, metadata.general);
    assert_eq!(parsed.converted_at, metadata.converted_at);

    let path = dir.path().join("run.bin.metadata.json");
    metadata.write_json(&path).unwrap();
    let read = RunMetadata::read_json(&path).unwrap();
    assert_eq!(read.scans.len(), 6);
    let scan_numbers: Vec<_> = read.scans.iter().map(|s| s.scan_number).collect();
    assert_eq!(scan_numbers, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(read.scans[2].ms2.as_ref().unwrap().master_scan, 1);
}

#[test]
fn test_run_info_json_roundtrip() {
    let info = RunInfo {
        number_of_filters: 3,
        ..Default::default()
    };
    assert_eq!(RunInfo::from_json(&info.to_json().unwrap()).unwrap(), info);
}

#[test]
fn test_invalid_json_is_an_error() {
    assert!(matches!(
        RunMetadata::from_json("{not json"),
        Err(MetadataError::JsonError(_))
    ));
}
