//! Temporary file and data set tracking.
//!
//! A [`ResourceTracker`] remembers every temporary it hands out and removes
//! them in [`ResourceTracker::cleanup`], which also runs when the tracker
//! is dropped. A failed removal is reported and the rest are still tried.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dd::DdStatement;
use crate::deck::{DeckError, DeckWriter, OversizePolicy};
use crate::service::{CreatedDataset, DatasetService, DatasetSpec, ServiceResult};

/// Qualifier marking data sets and files the tracker may delete.
pub const TEMP_QUALIFIER: &str = "TEMPRARY";

/// The user id in `id` output: `uid=0(IBMUSER) gid=0(SYS1)` -> `IBMUSER`.
pub fn parse_userid(id_output: &str) -> Option<String> {
    let start = id_output.find('(')? + 1;
    let len = id_output[start..].find(')')?;
    let user = id_output[start..start + len].trim();
    (!user.is_empty()).then(|| user.to_string())
}

/// Timestamp suffix with microsecond resolution, e.g. `1700000000.123456`.
fn timestamp() -> String {
    let now = Utc::now();
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

/// What [`ResourceTracker::cleanup`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed_files: Vec<PathBuf>,
    pub deleted_datasets: Vec<String>,
    /// Resources left in place because the tracker keeps them.
    pub kept: Vec<String>,
    /// One `Error erasing <name>` line per failed removal.
    pub errors: Vec<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Owns the temporaries of one tool run.
pub struct ResourceTracker<'a, D: DatasetService + ?Sized> {
    datasets: &'a D,
    userid: String,
    files: Vec<PathBuf>,
    created: Vec<CreatedDataset>,
    keep: bool,
    done: bool,
}

impl<'a, D: DatasetService + ?Sized> ResourceTracker<'a, D> {
    pub fn new(datasets: &'a D, userid: &str) -> Self {
        Self {
            datasets,
            userid: userid.to_uppercase(),
            files: Vec::new(),
            created: Vec::new(),
            keep: false,
            done: false,
        }
    }

    /// When set, cleanup reports resources instead of removing them.
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn userid(&self) -> &str {
        &self.userid
    }

    /// A fresh file name `<dir>/<NAME>.TEMPRARY.<timestamp>`, tracked for
    /// removal. The file itself is not created.
    pub fn temp_file_name(&mut self, name: &str, dir: &Path) -> PathBuf {
        let path = dir.join(format!("{}.{TEMP_QUALIFIER}.{}", name.to_uppercase(), timestamp()));
        self.track_file(path.clone());
        path
    }

    /// Track a file created elsewhere.
    pub fn track_file(&mut self, path: PathBuf) {
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    /// Allocate a data set under `<USERID>.TEMPRARY`.
    pub fn create_temp_dataset(&mut self, spec: &DatasetSpec) -> ServiceResult<CreatedDataset> {
        let hlq = format!("{}.{TEMP_QUALIFIER}", self.userid);
        let name = self.datasets.tmp_name(&hlq)?;
        self.create_dataset(spec, &name)
    }

    /// Allocate a data set with a generated name under `hlq`. It is tracked
    /// but kept by cleanup unless `hlq` marks it temporary.
    pub fn create_unique_dataset(&mut self, spec: &DatasetSpec, hlq: &str) -> ServiceResult<CreatedDataset> {
        let name = self.datasets.tmp_name(hlq)?;
        self.create_dataset(spec, &name)
    }

    /// Allocate a named data set and track it.
    pub fn create_dataset(&mut self, spec: &DatasetSpec, name: &str) -> ServiceResult<CreatedDataset> {
        let created = self.datasets.create(name, spec)?;
        debug!(dataset = %created.name, "Allocated");
        self.created.push(created.clone());
        Ok(created)
    }

    /// Write `lines` to a temp CP1047 file and return a DD for it.
    /// Oversized lines are left out with a warning.
    pub fn create_input_dd<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        ddname: &str,
        dir: &Path,
    ) -> Result<DdStatement, DeckError> {
        let path = self.temp_file_name(ddname, dir);
        let report = DeckWriter::new()
            .with_policy(OversizePolicy::Skip)
            .write(lines, &path)?;
        if !report.skipped.is_empty() {
            warn!(ddname, skipped = report.skipped.len(), "Lines left out of input DD");
        }
        Ok(DdStatement::file(ddname, path))
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn tracked_datasets(&self) -> &[CreatedDataset] {
        &self.created
    }

    /// Remove tracked files and delete tracked `TEMPRARY` data sets.
    /// Runs once; later calls return an empty report.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.done {
            return report;
        }
        self.done = true;

        for path in self.files.drain(..) {
            if self.keep {
                report.kept.push(path.display().to_string());
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => report.removed_files.push(path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot remove temp file");
                    report.errors.push(format!("Error erasing {}", path.display()));
                }
            }
        }

        for dataset in self.created.drain(..) {
            if !dataset.name.contains(TEMP_QUALIFIER) {
                continue;
            }
            if self.keep {
                report.kept.push(dataset.name);
                continue;
            }
            match self.datasets.delete(&dataset.name) {
                Ok(()) => report.deleted_datasets.push(dataset.name),
                Err(e) => {
                    warn!(dataset = %dataset.name, error = %e, "Cannot delete temp data set");
                    report.errors.push(format!("Error erasing {}", dataset.name));
                }
            }
        }

        if !report.kept.is_empty() {
            info!(kept = ?report.kept, "Temporary resources kept");
        }
        report
    }
}

impl<D: DatasetService + ?Sized> Drop for ResourceTracker<'_, D> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeDatasets;

    #[test]
    fn test_parse_userid() {
        assert_eq!(
            parse_userid("uid=0(IBMUSER) gid=0(SYS1) groups=2(TTY)").as_deref(),
            Some("IBMUSER")
        );
        assert_eq!(parse_userid("no parens"), None);
        assert_eq!(parse_userid("uid=0() gid=1"), None);
    }

    #[test]
    fn test_temp_file_name_layout() {
        let ds = FakeDatasets::new("IBMUSER");
        let mut tracker = ResourceTracker::new(&ds, "ibmuser");
        let path = tracker.temp_file_name("sysin", Path::new("/tmp"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("SYSIN.TEMPRARY."));
        assert!(path.starts_with("/tmp"));
        assert_eq!(tracker.files(), &[path.clone()]);
    }

    #[test]
    fn test_temp_dataset_under_userid() {
        let ds = FakeDatasets::new("IBMUSER");
        let mut tracker = ResourceTracker::new(&ds, "ibmuser");
        let created = tracker.create_temp_dataset(&DatasetSpec::pds()).unwrap();
        assert!(created.name.starts_with("IBMUSER.TEMPRARY."));
    }

    #[test]
    fn test_cleanup_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let ds = FakeDatasets::new("IBMUSER");
        let file;
        {
            let mut tracker = ResourceTracker::new(&ds, "IBMUSER");
            let dd = tracker.create_input_dd(&[" SET BDY(GLOBAL)."], "SMPCNTL", dir.path()).unwrap();
            file = dd.file_path().unwrap().to_path_buf();
            tracker.create_temp_dataset(&DatasetSpec::pds()).unwrap();
            tracker.create_dataset(&DatasetSpec::seq(), "IBMUSER.SMPLIST").unwrap();
            assert!(file.exists());
        }
        assert!(!file.exists());
        let remaining = ds.names();
        assert_eq!(remaining, vec!["IBMUSER.SMPLIST".to_string()]);
    }

    #[test]
    fn test_cleanup_continues_after_failed_delete() {
        let ds = FakeDatasets::new("IBMUSER");
        let mut tracker = ResourceTracker::new(&ds, "IBMUSER");
        let first = tracker.create_temp_dataset(&DatasetSpec::seq()).unwrap();
        let second = tracker.create_temp_dataset(&DatasetSpec::seq()).unwrap();
        ds.fail_delete(&first.name);

        let report = tracker.cleanup();
        assert_eq!(report.errors, vec![format!("Error erasing {}", first.name)]);
        assert_eq!(report.deleted_datasets, vec![second.name.clone()]);
        assert!(!report.is_clean());

        // Already cleaned; drop does nothing more.
        assert_eq!(tracker.cleanup(), CleanupReport::default());
    }

    #[test]
    fn test_keep_reports_without_removing() {
        let dir = tempfile::tempdir().unwrap();
        let ds = FakeDatasets::new("IBMUSER");
        let mut tracker = ResourceTracker::new(&ds, "IBMUSER").keep(true);
        let dd = tracker.create_input_dd(&["X"], "SYSIN", dir.path()).unwrap();
        let created = tracker.create_temp_dataset(&DatasetSpec::seq()).unwrap();

        let report = tracker.cleanup();
        assert_eq!(report.kept.len(), 2);
        assert!(dd.file_path().unwrap().exists());
        assert!(ds.names().contains(&created.name));
    }

    #[test]
    fn test_input_dd_skips_long_lines() {
        let dir = tempfile::tempdir().unwrap();
        let ds = FakeDatasets::new("IBMUSER");
        let mut tracker = ResourceTracker::new(&ds, "IBMUSER").keep(true);
        let long = "L".repeat(90);
        let dd = tracker
            .create_input_dd(&[" LIST.", long.as_str()], "SMPCNTL", dir.path())
            .unwrap();

        let bytes = fs::read(dd.file_path().unwrap()).unwrap();
        let lines = zoau_samples_encoding::CP1047.decode_lines(&bytes);
        assert_eq!(lines, vec![" LIST."]);
        assert_eq!(dd.name, "SMPCNTL");
    }
}
