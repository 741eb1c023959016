use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use log::{debug, info};

use crate::format::ScanNumber;
use crate::metadata::format_scan_details;
use crate::source::{
    is_supported_source, open_source, read_payload, RetrievalError, ScanAccessor, SourceFactory,
};

use super::{ScanDetailsResponse, ScanRangeResponse, SpectrumResponse, ViewerError};

/// Size and modification time a cached source was opened at
type FileStamp = (u64, Option<SystemTime>);

/// Read-only queries over the source files of one directory.
///
/// Opened sources are kept per file, so an artifact is indexed once rather
/// than on every query. A file whose size or modification time changes is
/// reopened. Each query still creates its own accessor.
#[derive(Clone)]
pub struct ViewerService {
    root: PathBuf,
    sources: Arc<Mutex<HashMap<PathBuf, (FileStamp, Arc<dyn SourceFactory>)>>>,
}

impl fmt::Debug for ViewerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerService")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ViewerService {
    /// Serve files from `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            sources: Arc::default(),
        }
    }

    /// Directory the service reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the files in the root directory that can be opened, sorted
    pub fn list_files(&self) -> Result<Vec<String>, ViewerError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file() && is_supported_source(&path) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();
        info!("Detected source files: {}", files.join(", "));
        Ok(files)
    }

    /// First and last scan number of `file`
    pub fn scan_range(&self, file: &str) -> Result<ScanRangeResponse, ViewerError> {
        debug!("Scan range for {}", file);
        let accessor = self.open(file)?;
        Ok(accessor.scan_range().into())
    }

    /// Human-readable description of one scan
    pub fn scan_details(
        &self,
        file: &str,
        scan: ScanNumber,
    ) -> Result<ScanDetailsResponse, ViewerError> {
        debug!("Scan details for {}, scan {}", file, scan);
        let mut accessor = self.open(file)?;
        check_scan(accessor.as_ref(), scan)?;
        let detail = accessor.scan_detail(scan)?;
        Ok(ScanDetailsResponse {
            scan_details: format_scan_details(&detail),
        })
    }

    /// Centroid peaks or profile points of one scan
    pub fn spectrum(&self, file: &str, scan: ScanNumber) -> Result<SpectrumResponse, ViewerError> {
        debug!("Spectrum for {}, scan {}", file, scan);
        let mut accessor = self.open(file)?;
        let payload = read_payload(accessor.as_mut(), scan)?;
        Ok(SpectrumResponse::new(scan, &payload))
    }

    fn open(&self, file: &str) -> Result<Box<dyn ScanAccessor>, ViewerError> {
        let path = self.resolve(file)?;
        let factory = self.factory(&path)?;
        Ok(factory.create_accessor()?)
    }

    /// Cached source for `path`, reopened when the file changed on disk
    fn factory(&self, path: &Path) -> Result<Arc<dyn SourceFactory>, ViewerError> {
        let metadata = fs::metadata(path)?;
        let stamp = (metadata.len(), metadata.modified().ok());

        let mut sources = self.sources.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached, factory)) = sources.get(path) {
            if *cached == stamp {
                return Ok(Arc::clone(factory));
            }
        }
        debug!("Opening {}", path.display());
        let factory: Arc<dyn SourceFactory> = Arc::from(open_source(path)?);
        sources.insert(path.to_path_buf(), (stamp, Arc::clone(&factory)));
        Ok(factory)
    }

    #[cfg(test)]
    pub(crate) fn cached_sources(&self) -> usize {
        self.sources.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Map a request path onto an existing file below the root
    fn resolve(&self, file: &str) -> Result<PathBuf, ViewerError> {
        let file = file.trim();
        if file.is_empty() {
            return Err(ViewerError::InvalidPath("empty path".to_string()));
        }
        let relative = Path::new(file);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ViewerError::InvalidPath(format!(
                "'{}' is outside the served directory",
                file
            )));
        }
        let path = self.root.join(relative);
        if !path.is_file() {
            return Err(ViewerError::InvalidPath(format!("'{}' does not exist", file)));
        }
        Ok(path)
    }
}

fn check_scan(accessor: &dyn ScanAccessor, scan: ScanNumber) -> Result<(), RetrievalError> {
    let range = accessor.scan_range();
    if range.contains(scan) {
        Ok(())
    } else {
        Err(RetrievalError::ScanOutOfRange { scan, range })
    }
}
