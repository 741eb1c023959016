//! A written artifact used as a scan source.
//!
//! The index is built once when the source is opened and shared; every
//! accessor opens its own file handle so accessors never contend.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::format::{
    ArtifactIndex, CentroidPoint, FormatError, ProfilePoint, ScanClassification, ScanNumber,
    ScanPayload, ScanRange,
};
use crate::metadata::ScanDetail;

use super::{RetrievalError, ScanAccessor, SourceError, SourceFactory};

/// Source factory over an artifact file
#[derive(Debug, Clone)]
pub struct ArtifactSource {
    path: PathBuf,
    index: Arc<ArtifactIndex>,
    range: ScanRange,
}

impl ArtifactSource {
    /// Open and index an artifact
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        let mut reader = BufReader::new(File::open(path)?);
        let index = ArtifactIndex::build(&mut reader).map_err(|e| match e {
            FormatError::IoError(io) => SourceError::Io(io),
            other => SourceError::Corrupt(format!("{}: {}", path.display(), other)),
        })?;

        let (first, last) = index.bounds().ok_or_else(|| {
            SourceError::Corrupt(format!("{}: artifact holds no records", path.display()))
        })?;
        let range = ScanRange::new(first, last)
            .map_err(|e| SourceError::Corrupt(format!("{}: {}", path.display(), e)))?;

        debug!(
            "Indexed {} records of {} (scans {})",
            index.len(),
            path.display(),
            range
        );

        Ok(Self {
            path: path.to_path_buf(),
            index: Arc::new(index),
            range,
        })
    }

    /// Index shared by all accessors
    pub fn index(&self) -> &ArtifactIndex {
        &self.index
    }
}

impl SourceFactory for ArtifactSource {
    fn create_accessor(&self) -> Result<Box<dyn ScanAccessor>, SourceError> {
        let file = File::open(&self.path)?;
        Ok(Box::new(ArtifactAccessor {
            reader: BufReader::new(file),
            index: Arc::clone(&self.index),
            range: self.range,
        }))
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Accessor reading records through its own file handle
#[derive(Debug)]
pub struct ArtifactAccessor {
    reader: BufReader<File>,
    index: Arc<ArtifactIndex>,
    range: ScanRange,
}

impl ArtifactAccessor {
    fn read(&mut self, scan: ScanNumber) -> Result<ScanPayload, RetrievalError> {
        if !self.range.contains(scan) {
            return Err(RetrievalError::ScanOutOfRange {
                scan,
                range: self.range,
            });
        }
        match self.index.read_record(&mut self.reader, scan) {
            Ok(Some(record)) => Ok(record.payload),
            Ok(None) => Err(RetrievalError::Read {
                scan,
                reason: "scan is not present in the artifact".to_string(),
            }),
            Err(e) => Err(RetrievalError::Corrupt {
                scan,
                reason: e.to_string(),
            }),
        }
    }
}

impl ScanAccessor for ArtifactAccessor {
    fn scan_range(&self) -> ScanRange {
        self.range
    }

    fn classification(&mut self, scan: ScanNumber) -> Result<ScanClassification, RetrievalError> {
        match self.index.get(scan) {
            Some(entry) => Ok(entry.classification),
            None if !self.range.contains(scan) => Err(RetrievalError::ScanOutOfRange {
                scan,
                range: self.range,
            }),
            None => Err(RetrievalError::Read {
                scan,
                reason: "scan is not present in the artifact".to_string(),
            }),
        }
    }

    fn centroid_points(&mut self, scan: ScanNumber) -> Result<Vec<CentroidPoint>, RetrievalError> {
        match self.read(scan)? {
            ScanPayload::Centroid(points) => Ok(points),
            ScanPayload::Profile(_) => Err(RetrievalError::unsupported(
                scan,
                "profile record has no centroid stream",
            )),
        }
    }

    fn profile_points(&mut self, scan: ScanNumber) -> Result<Vec<ProfilePoint>, RetrievalError> {
        match self.read(scan)? {
            ScanPayload::Profile(points) => Ok(points),
            ScanPayload::Centroid(_) => Err(RetrievalError::unsupported(
                scan,
                "centroid record has no profile trace",
            )),
        }
    }

    // Artifacts carry no acquisition attributes; the MS order stays unknown
    fn scan_detail(&mut self, scan: ScanNumber) -> Result<ScanDetail, RetrievalError> {
        let entry = self.index.get(scan).ok_or_else(|| RetrievalError::Read {
            scan,
            reason: "scan is not present in the artifact".to_string(),
        })?;
        Ok(ScanDetail {
            scan_number: scan,
            filter_text: format!("{} scan, {} points", entry.classification, entry.point_count),
            ..Default::default()
        })
    }
}
