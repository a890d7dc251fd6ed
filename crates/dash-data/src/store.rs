//! Saved report persistence
//!
//! Reports are kept newest first in a single JSON file. Each report's data is
//! cut down to a preview before writing, and when the list is over the byte
//! quota the oldest reports are dropped until it fits.

use dash_core::Report;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// File name of the report list inside the store directory
pub const STORE_FILE: &str = "insight_stream_reports.json";

/// Rows of data kept per persisted report
pub const MAX_PREVIEW_ROWS: usize = 100;

/// Default byte budget, matching a typical browser storage quota
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// Every report was written
    Saved { count: usize },
    /// Only the newest `kept` reports fit in the quota
    Trimmed { kept: usize, dropped: usize },
    /// Not even a single report fits; nothing was written
    CouldNotSave,
}

impl StoreStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, StoreStatus::CouldNotSave)
    }
}

/// Size-capped report list on disk
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
    quota_bytes: usize,
    preview_rows: usize,
}

impl ReportStore {
    /// Store inside `dir` with the default quota
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            preview_rows: MAX_PREVIEW_ROWS,
        }
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn with_preview_rows(mut self, preview_rows: usize) -> Self {
        self.preview_rows = preview_rows;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved list.
    ///
    /// A missing file is an empty list. A file that does not parse is
    /// removed and also read as empty.
    pub fn load(&self) -> Vec<Report> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not read {}: {}", self.path.display(), e);
                }
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Report>>(&text) {
            Ok(reports) => {
                debug!("Loaded {} reports from {}", reports.len(), self.path.display());
                reports
            }
            Err(e) => {
                warn!("Discarding corrupt report store {}: {}", self.path.display(), e);
                if let Err(e) = fs::remove_file(&self.path) {
                    error!("Failed to remove {}: {}", self.path.display(), e);
                }
                Vec::new()
            }
        }
    }

    /// Persist `reports` (newest first), dropping the oldest until the list
    /// fits the quota
    pub fn save(&self, reports: &[Report]) -> Result<StoreStatus, StoreError> {
        let compact: Vec<Report> = reports
            .iter()
            .map(|r| r.compact(self.preview_rows))
            .collect();

        let mut kept = compact.len();
        loop {
            let json = serde_json::to_string(&compact[..kept])?;
            if json.len() <= self.quota_bytes {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, json)?;

                let dropped = compact.len() - kept;
                return Ok(if dropped == 0 {
                    debug!("Saved {} reports", kept);
                    StoreStatus::Saved { count: kept }
                } else {
                    info!("Saved {} reports, dropped {} oldest to fit quota", kept, dropped);
                    StoreStatus::Trimmed { kept, dropped }
                });
            }
            if kept <= 1 {
                error!(
                    "Report store quota of {} bytes is too small for a single report",
                    self.quota_bytes
                );
                return Ok(StoreStatus::CouldNotSave);
            }
            kept -= 1;
        }
    }
}

/// Insert `report` at the front, replacing any report with the same name
pub fn add_report(reports: &[Report], report: Report) -> Vec<Report> {
    std::iter::once(report.clone())
        .chain(reports.iter().filter(|r| r.name != report.name).cloned())
        .collect()
}

/// The list without the report `id`
pub fn delete_report(reports: &[Report], id: &str) -> Vec<Report> {
    reports.iter().filter(|r| r.id != id).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::{row, AnalysisResult, DataRow};

    fn report(file: &str, rows: usize) -> Report {
        let data: Vec<DataRow> = (0..rows)
            .map(|i| row! { "i" => i as f64, "pad" => "xxxxxxxxxx" })
            .collect();
        Report::new(file, AnalysisResult::default(), data)
    }

    #[test]
    fn test_round_trip_trims_preview() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let reports = vec![report("a.csv", 150), report("b.csv", 3)];

        let status = store.save(&reports).unwrap();
        assert_eq!(status, StoreStatus::Saved { count: 2 });

        let loaded = store.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].data.len(), 100);
        assert_eq!(loaded[1].data.len(), 3);
        assert_eq!(reports[0].data.len(), 150);
    }

    #[test]
    fn test_quota_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let reports = vec![report("new.csv", 20), report("mid.csv", 20), report("old.csv", 20)];
        let one = serde_json::to_string(&reports[..1]).unwrap().len();
        let store = ReportStore::new(dir.path()).with_quota(one * 2 + 1);

        let status = store.save(&reports).unwrap();
        assert_eq!(status, StoreStatus::Trimmed { kept: 2, dropped: 1 });
        let names: Vec<_> = store.load().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["new", "mid"]);
    }

    #[test]
    fn test_could_not_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path()).with_quota(10);
        let status = store.save(&[report("big.csv", 5)]).unwrap();
        assert!(status.is_error());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_add_replaces_same_name() {
        let first = report("sales.csv", 1);
        let other = report("costs.csv", 1);
        let reports = add_report(&add_report(&[], first.clone()), other.clone());
        let again = report("sales.json", 2);
        let reports = add_report(&reports, again.clone());

        let ids: Vec<_> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![again.id.as_str(), other.id.as_str()]);

        let reports = delete_report(&reports, &other.id);
        assert_eq!(reports.len(), 1);
    }
}
