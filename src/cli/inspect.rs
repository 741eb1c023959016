use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mzbin::format::{ArtifactReader, ScanPayload, ScanRecord};

/// Display the header and leading records of an artifact
pub fn run(file: PathBuf, records: usize, csv: Option<PathBuf>) -> Result<ExitCode> {
    let mut reader = ArtifactReader::open(&file)
        .with_context(|| format!("Failed to open artifact {}", file.display()))?;
    let file_size = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);

    println!("Artifact Information");
    println!("====================");
    println!("File: {}", file.display());
    println!("Size: {} bytes", file_size);
    println!("Declared scan count: {}", reader.declared_scan_count());
    println!();

    let mut exporter = csv.as_deref().map(CsvExporter::create).transpose()?;

    let mut count = 0usize;
    let mut points = 0usize;
    let mut bounds: Option<(i32, i32)> = None;
    if records > 0 {
        println!("{:>10}  {:<9}  {:>8}  {:>12}  {:>12}", "Scan", "Type", "Points", "First m/z", "Last m/z");
    }
    while let Some(record) = reader
        .next_record()
        .with_context(|| format!("Failed to decode record {} of {}", count + 1, file.display()))?
    {
        if count < records {
            print_record(&record);
        }
        if let Some(exporter) = exporter.as_mut() {
            exporter.write(&record)?;
        }
        count += 1;
        points += record.payload.len();
        bounds = Some(match bounds {
            None => (record.scan_number, record.scan_number),
            Some((lo, hi)) => (lo.min(record.scan_number), hi.max(record.scan_number)),
        });
    }
    if count > records {
        println!("{:>10}", format!("... {} more", count - records));
    }

    println!();
    println!("Records: {}", count);
    println!("Points: {}", points);
    if let Some((lo, hi)) = bounds {
        println!("Scan numbers: {}-{}", lo, hi);
    }

    if let (Some(exporter), Some(path)) = (exporter, csv.as_deref()) {
        let rows = exporter.finish()?;
        println!("Exported {} points to {}", rows, path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn print_record(record: &ScanRecord) {
    let pairs = record.payload.mass_intensity();
    let first = pairs.first().map(|p| format!("{:.4}", p.0)).unwrap_or_default();
    let last = pairs.last().map(|p| format!("{:.4}", p.0)).unwrap_or_default();
    println!(
        "{:>10}  {:<9}  {:>8}  {:>12}  {:>12}",
        record.scan_number,
        record.classification().to_string(),
        record.payload.len(),
        first,
        last
    );
}

/// Long-format CSV: one row per point
struct CsvExporter {
    writer: csv::Writer<std::fs::File>,
    rows: usize,
}

impl CsvExporter {
    fn create(path: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
        writer.write_record(["scan_number", "type", "mass", "intensity", "charge"])?;
        Ok(Self { writer, rows: 0 })
    }

    fn write(&mut self, record: &ScanRecord) -> Result<()> {
        let scan = record.scan_number.to_string();
        let kind = record.classification().to_string();
        match &record.payload {
            ScanPayload::Centroid(points) => {
                for p in points {
                    self.writer.write_record([
                        &scan,
                        &kind,
                        &p.mass.to_string(),
                        &p.intensity.to_string(),
                        &p.charge.to_string(),
                    ])?;
                }
            }
            ScanPayload::Profile(points) => {
                for p in points {
                    self.writer.write_record([
                        &scan,
                        &kind,
                        &p.mass.to_string(),
                        &p.intensity.to_string(),
                        &String::new(),
                    ])?;
                }
            }
        }
        self.rows += record.payload.len();
        Ok(())
    }

    fn finish(mut self) -> Result<usize> {
        self.writer.flush().context("Failed to flush CSV file")?;
        Ok(self.rows)
    }
}
