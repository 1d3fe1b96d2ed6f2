use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::state::{FailureReason, FileState, FileStatus, StateHistory};

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    /// Input path as given
    pub path: PathBuf,
    /// File name
    pub file_name: String,
    /// Final outcome
    #[serde(flatten)]
    pub status: FileStatus,
    /// States in the order they were entered
    pub history: StateHistory,
    /// Result directory, for exported files
    pub output_directory: Option<PathBuf>,
    /// Observation rows written
    pub observations: usize,
    /// Profile rows written
    pub profiles: usize,
    /// Failed validation checks, fatal or not
    pub validation_failures: Vec<String>,
    /// Wall time spent on the file
    pub elapsed_ms: u64,
}

impl FileRecord {
    pub(crate) fn new(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            file_name,
            status: FileStatus::Done,
            history: StateHistory::default(),
            output_directory: None,
            observations: 0,
            profiles: 0,
            validation_failures: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Final state
    pub fn state(&self) -> FileState {
        self.history.current()
    }
}

/// Aggregated outcome of a batch run, keyed by input path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Output root
    pub output_dir: PathBuf,
    /// Inputs submitted
    pub total: usize,
    /// Files finished successfully
    pub done: usize,
    /// Files refused on validation grounds
    pub rejected: usize,
    /// Files aborted by an error
    pub failed: usize,
    /// Whether cancellation was requested during the run
    pub cancelled: bool,
    /// Per-file records
    pub files: BTreeMap<String, FileRecord>,
}

impl BatchReport {
    pub(crate) fn new(output_dir: PathBuf, total: usize) -> Self {
        Self {
            output_dir,
            total,
            ..Self::default()
        }
    }

    /// Append the record of a finished file
    pub fn add(&mut self, record: FileRecord) {
        match &record.status {
            FileStatus::Done => self.done += 1,
            FileStatus::Rejected { .. } => self.rejected += 1,
            FileStatus::Failed { .. } => self.failed += 1,
        }
        self.files.insert(record.path.display().to_string(), record);
    }

    /// Record of an input, looked up by path or by file name
    pub fn get(&self, key: &str) -> Option<&FileRecord> {
        self.files
            .get(key)
            .or_else(|| self.files.values().find(|r| r.file_name == key))
    }

    /// Whether every file finished successfully
    pub fn is_success(&self) -> bool {
        self.rejected == 0 && self.failed == 0
    }

    /// Number of files with a given reason code
    pub fn count_reason(&self, reason: FailureReason) -> usize {
        self.files
            .values()
            .filter(|r| r.status.reason() == Some(reason))
            .count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch Report")?;
        writeln!(f, "============")?;
        writeln!(f, "Output: {}", self.output_dir.display())?;
        for record in self.files.values() {
            write!(f, "  {}: {}", record.file_name, record.status)?;
            if record.status.is_done() {
                write!(f, " ({} observations, {} profiles)", record.observations, record.profiles)?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "Summary: {} done, {} rejected, {} failed of {}{}",
            self.done,
            self.rejected,
            self.failed,
            self.total,
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}
