use std::collections::BTreeSet;
use std::fs;
use std::io::Write;

use tempfile::tempdir;

use super::*;
use crate::format::{
    Artifact, CentroidPoint, ProfilePoint, ScanClassification, ScanNumber, ScanRange,
    HEADER_SIZE, RECORD_HEADER_SIZE,
};
use crate::metadata::RunMetadata;
use crate::source::{MemorySource, RetrievalError, ScanAccessor, SourceError};

const PROFILE_RECORD: usize = RECORD_HEADER_SIZE + 3 * crate::format::PROFILE_POINT_SIZE;

/// Scans `first..=last`, each a profile scan of 3 points (mass 100+i, intensity 1000)
fn uniform_source(first: i32, last: i32) -> crate::source::MemorySourceBuilder {
    let points = [(100.0, 1000.0), (101.0, 1000.0), (102.0, 1000.0)];
    (first..=last).fold(
        MemorySource::builder().name("uniform").range(first, last),
        |builder, scan| builder.profile_scan(scan, &points),
    )
}

fn write_partitioned(source: &MemorySource, workers: usize, sink: SinkKind) -> (Vec<u8>, ParallelStats) {
    let mut output = Vec::new();
    let stats = PartitionedWriter::new(workers)
        .with_sink(sink)
        .write_parallel_to(source, source.scan_range(), &mut output)
        .unwrap();
    (output, stats)
}

#[test]
fn test_partition_two_workers() {
    let range = ScanRange::new(1, 10).unwrap();
    let partitions = partition_range(range, 2);
    assert_eq!(partitions.len(), 2);
    assert_eq!((partitions[0].start_scan, partitions[0].end_scan), (1, 5));
    assert_eq!((partitions[1].start_scan, partitions[1].end_scan), (6, 10));
}

#[test]
fn test_partition_remainder_goes_to_last_worker() {
    let range = ScanRange::new(1, 10).unwrap();
    let partitions = partition_range(range, 3);
    let bounds: Vec<_> = partitions.iter().map(|p| (p.start_scan, p.end_scan)).collect();
    assert_eq!(bounds, vec![(1, 3), (4, 6), (7, 10)]);
}

#[test]
fn test_partition_more_workers_than_scans() {
    let range = ScanRange::new(1, 3).unwrap();
    let partitions = partition_range(range, 5);
    assert_eq!(partitions.len(), 5);
    for partition in &partitions[..4] {
        assert!(partition.is_empty());
        assert_eq!(partition.len(), 0);
        assert_eq!(partition.end_scan, partition.start_scan - 1);
    }
    assert_eq!((partitions[4].start_scan, partitions[4].end_scan), (1, 3));
}

#[test]
fn test_partition_zero_workers_treated_as_one() {
    let range = ScanRange::new(5, 9).unwrap();
    let partitions = partition_range(range, 0);
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0].scans(), 5..=9);
}

#[test]
fn test_partitioned_artifact_layout() {
    let source = uniform_source(1, 10).build().unwrap();
    let (bytes, stats) = write_partitioned(&source, 2, SinkKind::Memory);

    assert_eq!(&bytes[0..4], &10i32.to_le_bytes());
    assert_eq!(&bytes[4..8], &1i32.to_le_bytes());
    assert_eq!(bytes[8], 0);
    assert_eq!(&bytes[9..13], &3i32.to_le_bytes());
    assert_eq!(&bytes[13..21], &100.0f64.to_le_bytes());
    assert_eq!(&bytes[21..29], &1000.0f64.to_le_bytes());
    assert_eq!(bytes.len(), HEADER_SIZE + 10 * PROFILE_RECORD);
    assert_eq!(stats.bytes_written, bytes.len() as u64);

    let totals = stats.totals();
    assert_eq!(totals.scans_written, 10);
    assert_eq!(totals.points_written, 30);
    assert_eq!(stats.partitions[0].write.scans_written, 5);
    assert_eq!(stats.partitions[1].write.scans_written, 5);
}

#[test]
fn test_partitioned_output_in_scan_order() {
    let source = MemorySource::synthetic(100, 8).unwrap();
    let (bytes, _) = write_partitioned(&source, 4, SinkKind::Memory);
    let artifact = Artifact::from_bytes(&bytes).unwrap();

    assert_eq!(artifact.declared_scan_count, 100);
    assert_eq!(artifact.scan_numbers(), (1..=100).collect::<Vec<_>>());
    assert_eq!(artifact.records[0].classification(), ScanClassification::Profile);
    assert_eq!(artifact.records[1].classification(), ScanClassification::Centroid);
}

#[test]
fn test_partitioned_matches_sequential() {
    let source = MemorySource::synthetic(57, 5).unwrap();
    let range = source.scan_range();

    let mut sequential = Vec::new();
    let mut accessor = source.create_accessor().unwrap();
    SequentialWriter::new()
        .write(accessor.as_mut(), range, &mut sequential)
        .unwrap();

    for workers in [1, 2, 3, 8, 64] {
        let (parallel, _) = write_partitioned(&source, workers, SinkKind::Memory);
        assert_eq!(parallel, sequential, "workers = {}", workers);
    }
}

#[test]
fn test_more_workers_than_scans_writes_every_scan() {
    let source = uniform_source(1, 3).build().unwrap();
    let (bytes, stats) = write_partitioned(&source, 5, SinkKind::Memory);
    let artifact = Artifact::from_bytes(&bytes).unwrap();

    assert_eq!(artifact.scan_numbers(), vec![1, 2, 3]);
    assert_eq!(stats.partitions.len(), 5);
    // empty partitions never ask for an accessor
    assert_eq!(source.accessors_created(), 1);
}

#[test]
fn test_unreadable_scan_is_skipped() {
    let clean = uniform_source(1, 10).build().unwrap();
    let broken = uniform_source(1, 10)
        .failing_scan(5, "bad checksum")
        .build()
        .unwrap();

    let (clean_bytes, _) = write_partitioned(&clean, 2, SinkKind::Memory);
    let (broken_bytes, stats) = write_partitioned(&broken, 2, SinkKind::Memory);

    assert_eq!(clean_bytes.len() - broken_bytes.len(), PROFILE_RECORD);
    let artifact = Artifact::from_bytes(&broken_bytes).unwrap();
    assert_eq!(artifact.declared_scan_count, 10);
    assert_eq!(artifact.scan_numbers(), vec![1, 2, 3, 4, 6, 7, 8, 9, 10]);

    let totals = stats.totals();
    assert_eq!(totals.scans_skipped, 1);
    assert_eq!(totals.skipped, vec![5]);
}

#[test]
fn test_accessor_failure_empties_one_partition() {
    let source = uniform_source(1, 10).failing_accessor(0).build().unwrap();
    let (bytes, stats) = write_partitioned(&source, 2, SinkKind::Memory);
    let artifact = Artifact::from_bytes(&bytes).unwrap();

    assert_eq!(stats.failed_partitions(), 1);
    assert_eq!(source.accessors_created(), 2);
    assert_eq!(artifact.declared_scan_count, 10);

    let scans = artifact.scan_numbers();
    // the first worker to ask for an accessor is the one that fails
    assert!(
        scans == vec![1, 2, 3, 4, 5] || scans == vec![6, 7, 8, 9, 10],
        "unexpected scans {:?}",
        scans
    );
    let failed = stats.partitions.iter().find(|p| p.failed()).unwrap();
    assert_eq!(failed.write.scans_written, 0);
    assert!(failed.setup_error.as_deref().unwrap().contains("accessor"));
}

#[test]
fn test_file_and_memory_sinks_agree() {
    let source = MemorySource::synthetic(40, 6).unwrap();
    let (memory, _) = write_partitioned(&source, 3, SinkKind::Memory);
    let (file, _) = write_partitioned(&source, 3, SinkKind::File);
    assert_eq!(memory, file);
}

#[test]
fn test_partition_files_removed_after_merge() {
    let temp = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let output = out_dir.path().join("run.bin");
    let source = MemorySource::synthetic(30, 4).unwrap();

    PartitionedWriter::new(3)
        .with_temp_dir(Some(temp.path().to_path_buf()))
        .write_parallel(&source, source.scan_range(), &output)
        .unwrap();

    assert!(output.exists());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_parallel_write_is_idempotent() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.bin");
    let second = dir.path().join("second.bin");
    let source = MemorySource::synthetic(64, 10).unwrap();
    let writer = PartitionedWriter::new(4);

    writer.write_parallel(&source, source.scan_range(), &first).unwrap();
    writer.write_parallel(&source, source.scan_range(), &second).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

fn write_sequential(source: &MemorySource) -> (Vec<u8>, WriteStats) {
    let mut output = Vec::new();
    let mut accessor = source.create_accessor().unwrap();
    let stats = SequentialWriter::new()
        .write(accessor.as_mut(), source.scan_range(), &mut output)
        .unwrap();
    (output, stats)
}

#[test]
fn test_sequential_write_is_idempotent() {
    let source = uniform_source(1, 10).build().unwrap();
    let (first, _) = write_sequential(&source);
    let (second, stats) = write_sequential(&source);

    assert_eq!(first, second);
    assert_eq!(first.len(), HEADER_SIZE + 10 * PROFILE_RECORD);
    assert_eq!(stats.bytes_written, first.len() as u64);
}

#[test]
fn test_sequential_skip_drops_exactly_one_record() {
    let clean = uniform_source(1, 10).build().unwrap();
    let broken = uniform_source(1, 10)
        .failing_scan(7, "unreadable trailer")
        .build()
        .unwrap();

    let (clean_bytes, _) = write_sequential(&clean);
    let (broken_bytes, stats) = write_sequential(&broken);

    assert_eq!(clean_bytes.len() - broken_bytes.len(), PROFILE_RECORD);
    assert_eq!(stats.skipped, vec![7]);
    let artifact = Artifact::from_bytes(&broken_bytes).unwrap();
    assert_eq!(artifact.declared_scan_count, 10);
    assert_eq!(artifact.scan_numbers(), vec![1, 2, 3, 4, 5, 6, 8, 9, 10]);
}

#[test]
fn test_empty_scan_is_a_bare_record() {
    let source = MemorySource::builder()
        .range(1, 1)
        .profile_scan(1, &[])
        .build()
        .unwrap();
    let (bytes, _) = write_sequential(&source);

    assert_eq!(bytes.len(), HEADER_SIZE + RECORD_HEADER_SIZE);
    let artifact = Artifact::from_bytes(&bytes).unwrap();
    assert_eq!(artifact.scan_numbers(), vec![1]);
    assert!(artifact.records[0].payload.is_empty());
}

#[test]
fn test_two_scans_four_workers() {
    let source = uniform_source(1, 2).build().unwrap();
    let (bytes, stats) = write_partitioned(&source, 4, SinkKind::Memory);
    let (sequential, _) = write_sequential(&source);

    assert_eq!(bytes, sequential);
    assert_eq!(Artifact::from_bytes(&bytes).unwrap().scan_numbers(), vec![1, 2]);
    assert_eq!(stats.totals().scans_written, 2);
}

#[test]
fn test_shared_sink_holds_same_records() {
    let source = MemorySource::synthetic(50, 4).unwrap();
    let (ordered, _) = write_partitioned(&source, 4, SinkKind::Memory);

    let mut shared = Vec::new();
    let stats = SharedSinkWriter::new(4)
        .write(&source, source.scan_range(), &mut shared)
        .unwrap();

    assert_eq!(shared.len(), ordered.len());
    assert_eq!(stats.bytes_written, shared.len() as u64);

    let ordered = Artifact::from_bytes(&ordered).unwrap();
    let shared = Artifact::from_bytes(&shared).unwrap();
    assert_eq!(shared.declared_scan_count, 50);

    let mut records = shared.records.clone();
    records.sort_by_key(|r| r.scan_number);
    assert_eq!(records, ordered.records);
}

/// Source whose reader panics on scan 6
struct CrashingSource;

struct CrashingAccessor;

impl SourceFactory for CrashingSource {
    fn create_accessor(&self) -> Result<Box<dyn ScanAccessor>, SourceError> {
        Ok(Box::new(CrashingAccessor))
    }

    fn name(&self) -> String {
        "crashing".to_string()
    }
}

impl ScanAccessor for CrashingAccessor {
    fn scan_range(&self) -> ScanRange {
        ScanRange::new(1, 8).unwrap()
    }

    fn classification(&mut self, scan: ScanNumber) -> Result<ScanClassification, RetrievalError> {
        if scan == 6 {
            panic!("reader crashed on scan 6");
        }
        Ok(ScanClassification::Profile)
    }

    fn centroid_points(&mut self, _scan: ScanNumber) -> Result<Vec<CentroidPoint>, RetrievalError> {
        Ok(Vec::new())
    }

    fn profile_points(&mut self, _scan: ScanNumber) -> Result<Vec<ProfilePoint>, RetrievalError> {
        Ok(vec![ProfilePoint::new(100.0, 1.0)])
    }
}

#[test]
#[should_panic(expected = "reader crashed on scan 6")]
fn test_shared_sink_worker_panic_propagates() {
    let range = ScanRange::new(1, 8).unwrap();
    let mut output = Vec::new();
    let _ = SharedSinkWriter::new(2).write(&CrashingSource, range, &mut output);
}

#[test]
fn test_zero_workers_rejected() {
    let source = uniform_source(1, 4).build().unwrap();
    let result = PartitionedWriter::new(0).write_parallel_to(&source, source.scan_range(), &mut Vec::new());
    assert!(matches!(result, Err(ConversionError::InvalidConfig(_))));
}

#[test]
fn test_progress_reporter_summary() {
    let reporter = ProgressReporter::start(3, 1).unwrap();
    {
        let sender = reporter.sender().unwrap().for_worker(2);
        assert_eq!(sender.worker(), 2);
        sender.scan(&ScanOutcome::Written {
            scan: 1,
            classification: ScanClassification::Profile,
            points: 3,
            bytes: PROFILE_RECORD,
        });
        sender.scan(&ScanOutcome::Skipped {
            scan: 2,
            reason: RetrievalError::Read {
                scan: 2,
                reason: "gone".to_string(),
            },
        });
        sender.partition_failed("no accessor");
        sender.partition_finished(1, 1);
    }
    let summary = reporter.finish().unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.written, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0, 2);
    assert!(summary.skipped[0].1.contains("gone"));
    assert_eq!(summary.failed_partitions, vec![(2, "no accessor".to_string())]);
}

#[test]
fn test_writers_report_progress() {
    let source = uniform_source(1, 12).failing_scan(7, "bad").build().unwrap();
    let reporter = ProgressReporter::start(12, 0).unwrap();
    PartitionedWriter::new(3)
        .with_sink(SinkKind::Memory)
        .with_progress(reporter.sender())
        .write_parallel_to(&source, source.scan_range(), &mut Vec::new())
        .unwrap();
    let summary = reporter.finish().unwrap();

    assert_eq!(summary.processed, 12);
    assert_eq!(summary.written, 11);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0, 7);
}

#[test]
fn test_atomic_write_failure_leaves_no_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.bin");

    let result: Result<(), ConversionError> = write_atomically(&output, |w| {
        w.write_all(b"partial")?;
        Err(ConversionError::InvalidConfig("boom".to_string()))
    });

    assert!(result.is_err());
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_atomic_write_failure_keeps_previous_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.bin");
    fs::write(&output, b"previous").unwrap();

    let result: Result<(), ConversionError> = write_atomically(&output, |w| {
        w.write_all(b"replacement")?;
        Err(ConversionError::InvalidConfig("boom".to_string()))
    });

    assert!(result.is_err());
    assert_eq!(fs::read(&output).unwrap(), b"previous");
}

#[test]
fn test_write_mode_parsing() {
    assert_eq!("sequential".parse::<WriteMode>().unwrap(), WriteMode::Sequential);
    assert_eq!("Parallel".parse::<WriteMode>().unwrap(), WriteMode::Parallel);
    assert_eq!("partitioned".parse::<WriteMode>().unwrap(), WriteMode::Parallel);
    assert_eq!("shared".parse::<WriteMode>().unwrap(), WriteMode::Shared);
    assert!("threads".parse::<WriteMode>().is_err());
    assert_eq!("memory".parse::<SinkKind>().unwrap(), SinkKind::Memory);
    assert_eq!(WriteMode::Shared.to_string(), "shared");
}

#[test]
fn test_config_validation() {
    assert!(ConversionConfig::default().validate().is_ok());
    assert!(ConversionConfig::sequential().with_workers(0).validate().is_ok());
    assert!(ConversionConfig::parallel(0).validate().is_err());
    let missing = ConversionConfig::default()
        .with_temp_dir(Some(std::path::PathBuf::from("/definitely/not/here")));
    assert!(missing.validate().is_err());
}

#[test]
fn test_converter_modes_produce_same_records() {
    let dir = tempdir().unwrap();
    let source = MemorySource::synthetic(45, 6).unwrap();

    let mut artifacts = Vec::new();
    for mode in [WriteMode::Sequential, WriteMode::Parallel, WriteMode::Shared] {
        let output = dir.path().join(format!("{}.bin", mode));
        let config = ConversionConfig::parallel(3)
            .with_mode(mode)
            .with_progress_interval(0);
        let stats = Converter::with_config(config).convert(&source, &output).unwrap();

        assert_eq!(stats.mode, mode);
        assert_eq!(stats.scans_requested, 45);
        assert_eq!(stats.scans_written, 45);
        assert_eq!(stats.bytes_written, fs::metadata(&output).unwrap().len());
        assert_eq!(stats.scans_missing(), 0);

        let mut artifact = crate::format::read_artifact(&output).unwrap();
        artifact.records.sort_by_key(|r| r.scan_number);
        artifacts.push(artifact.records);
    }
    assert_eq!(artifacts[0], artifacts[1]);
    assert_eq!(artifacts[0], artifacts[2]);
}

#[test]
fn test_converter_reports_skips_in_order() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("run.bin");
    let source = uniform_source(1, 20)
        .failing_scan(17, "bad")
        .failing_scan(3, "bad")
        .build()
        .unwrap();

    let stats = Converter::with_config(ConversionConfig::parallel(4).with_mode(WriteMode::Shared))
        .convert(&source, &output)
        .unwrap();

    assert_eq!(stats.scans_written, 18);
    assert_eq!(stats.scans_skipped, 2);
    assert_eq!(stats.skipped_scans, vec![3, 17]);
    assert_eq!(stats.failed_partitions, 0);
    assert!(stats.to_string().contains("18 of 20 scans written"));
}

#[test]
fn test_converter_writes_metadata_sidecar() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("run.bin");
    let source = MemorySource::synthetic(10, 2).unwrap();

    let stats = Converter::with_config(ConversionConfig::parallel(2).with_metadata(true))
        .convert(&source, &output)
        .unwrap();

    let sidecar = stats.metadata_path.unwrap();
    assert_eq!(sidecar, crate::metadata::sidecar_path(&output));
    let metadata = RunMetadata::read_json(&sidecar).unwrap();
    assert_eq!(metadata.scans.len(), 10);
    assert_eq!(metadata.general.first_scan, 1);
    assert_eq!(metadata.general.last_scan, 10);
}

#[test]
fn test_converter_source_failure_is_fatal() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("run.bin");
    // the primary accessor is the first one requested
    let source = uniform_source(1, 5).failing_accessor(0).build().unwrap();

    let result = Converter::with_config(ConversionConfig::parallel(2)).convert(&source, &output);
    assert!(matches!(result, Err(ConversionError::SourceError(_))));
    assert!(!output.exists());
}

#[test]
fn test_converter_partition_failure_is_not_fatal() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("run.bin");
    let source = uniform_source(1, 10).failing_accessor(1).build().unwrap();

    let stats = Converter::with_config(ConversionConfig::parallel(2))
        .convert(&source, &output)
        .unwrap();

    assert_eq!(stats.failed_partitions, 1);
    assert_eq!(stats.scans_written, 5);
    assert_eq!(stats.scans_missing(), 5);

    let artifact = crate::format::read_artifact(&output).unwrap();
    assert_eq!(artifact.declared_scan_count, 10);
    let scans: BTreeSet<_> = artifact.scan_numbers().into_iter().collect();
    assert_eq!(scans.len(), 5);
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_partitions_cover_range_exactly(
            first in 1i32..100_000,
            len in 1i32..5_000,
            workers in 1usize..64,
        ) {
            let range = ScanRange::new(first, first + len - 1).unwrap();
            let partitions = partition_range(range, workers);
            prop_assert_eq!(partitions.len(), workers);

            let covered: Vec<i32> = partitions.iter().flat_map(|p| p.scans()).collect();
            prop_assert_eq!(covered, range.iter().collect::<Vec<_>>());

            let base = range.len() / workers;
            let remainder = range.len() % workers;
            for (i, partition) in partitions.iter().enumerate() {
                prop_assert_eq!(partition.worker_index, i);
                let expected = if i == workers - 1 { base + remainder } else { base };
                prop_assert_eq!(partition.len(), expected);
            }
        }
    }
}
