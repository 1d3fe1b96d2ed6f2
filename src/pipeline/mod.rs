//! # Orchestrator
//!
//! Runs the four stages (explore, validate, preprocess, export) for every
//! input file and aggregates the outcomes into a [`BatchReport`].
//!
//! ## Concurrency
//!
//! ```text
//! ┌────────────┐   one task per file   ┌──────────────┐  FileRecord  ┌───────────┐
//! │ BatchRunner│ ────────────────────▶ │ rayon pool   │ ───────────▶ │ collector │ ─▶ BatchReport
//! │            │                       │ (`workers`)  │   channel    │ (1 thread)│
//! └────────────┘                       └──────────────┘              └───────────┘
//! ```
//!
//! Stages of one file run strictly in sequence; files run in parallel up to
//! the configured worker count. Workers share nothing but the output root
//! and the completion channel, and the collector appends exactly one record
//! per file. Inputs that would export into the same result directory (same
//! file name in different folders) are detected before scheduling: the first
//! in path order runs, the others fail with `duplicate_output`.
//!
//! ## Failure Isolation
//!
//! Every hard error, including a worker panic, is caught at the per-file
//! boundary and recorded with a [`FailureReason`]. One file never stops its
//! siblings, and a batch always yields a report.
//!
//! ## Example
//!
//! ```rust,no_run
//! use argo_dataops::config::PipelineConfig;
//! use argo_dataops::pipeline::{discover_inputs, BatchRunner};
//!
//! let files = discover_inputs("data/argo")?;
//! let report = BatchRunner::new(PipelineConfig::default()).run(&files, "out".as_ref())?;
//! println!("{}", report);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cancel;
mod error;
mod report;
mod state;

#[cfg(test)]
mod tests;

pub use cancel::CancellationToken;
pub use error::PipelineError;
pub use report::{BatchReport, FileRecord};
pub use state::{FailureReason, FileState, FileStatus, StateHistory};

use std::collections::hash_map::{Entry, HashMap};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crossbeam_channel::unbounded;
use log::{debug, info, warn};

use crate::argo::FileCategory;
use crate::config::PipelineConfig;
use crate::export::{ExportInput, Exporter, ProcessingLog};
use crate::preprocess::{PreprocessError, Preprocessor};
use crate::schema::explore_path;
use crate::validator::{CheckCategory, Validator};

/// Expand an input path into the NetCDF files it names.
///
/// A directory yields its `*.nc` files (not recursive), sorted by name; any
/// other path is returned as is.
pub fn discover_inputs<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<PathBuf>> {
    let path = path.as_ref();
    if !path.is_dir() {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input not found: {}", path.display()),
            ));
        }
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let candidate = entry.path();
        let is_netcdf = candidate
            .extension()
            .map(|e| e.eq_ignore_ascii_case("nc"))
            .unwrap_or(false);
        if is_netcdf && candidate.is_file() {
            files.push(candidate);
        }
    }
    files.sort();
    Ok(files)
}

/// Processes batches of files with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    config: PipelineConfig,
}

impl BatchRunner {
    /// Create a runner
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process `files`, writing results below `output_dir`
    pub fn run(&self, files: &[PathBuf], output_dir: &Path) -> Result<BatchReport, PipelineError> {
        self.run_with_cancel(files, output_dir, &CancellationToken::new())
    }

    /// Process `files`, stopping cooperatively once `cancel` is set
    pub fn run_with_cancel(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, PipelineError> {
        self.config.validate()?;
        fs::create_dir_all(output_dir)?;

        let mut inputs = files.to_vec();
        inputs.sort();
        inputs.dedup();
        let total = inputs.len();
        let (inputs, duplicates) = split_colliding_outputs(inputs);
        info!(
            "Processing {} files with {} workers into {}",
            total,
            self.config.workers,
            output_dir.display()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("argo-worker-{}", i))
            .build()?;
        let (sender, receiver) = unbounded::<FileRecord>();
        let config = &self.config;

        let mut report = std::thread::scope(|s| {
            let collector = s.spawn(move || {
                let mut report = BatchReport::new(output_dir.to_path_buf(), total);
                for record in receiver {
                    info!(
                        "[{}/{}] {}: {}",
                        report.files.len() + 1,
                        total,
                        record.file_name,
                        record.status
                    );
                    report.add(record);
                }
                report
            });

            for (path, claimed_by) in &duplicates {
                warn!(
                    "{}: result directory already claimed by {}",
                    path.display(),
                    claimed_by.display()
                );
                let mut record = FileRecord::new(path.clone());
                fail(
                    &mut record,
                    FailureReason::DuplicateOutput,
                    format!("same result directory as {}", claimed_by.display()),
                );
                if sender.send(record).is_err() {
                    warn!("{}: collector gone, result dropped", path.display());
                }
            }

            pool.scope(|scope| {
                for path in &inputs {
                    let sender = sender.clone();
                    scope.spawn(move |_| {
                        let record = process_guarded(path, output_dir, config, cancel);
                        if sender.send(record).is_err() {
                            warn!("{}: collector gone, result dropped", path.display());
                        }
                    });
                }
            });
            drop(sender);

            collector.join().map_err(|_| PipelineError::Collector)
        })?;

        report.cancelled = cancel.is_cancelled();
        info!(
            "Batch finished: {} done, {} rejected, {} failed",
            report.done, report.rejected, report.failed
        );
        Ok(report)
    }

    /// Process a single file on the calling thread
    pub fn process_file(&self, path: &Path, output_dir: &Path) -> FileRecord {
        process_guarded(path, output_dir, &self.config, &CancellationToken::new())
    }
}

/// Name of the directory an input is exported under
fn result_stem(path: &Path) -> String {
    let name = FileRecord::new(path.to_path_buf()).file_name;
    name.strip_suffix(".nc").unwrap_or(&name).to_string()
}

/// Split sorted inputs into those that run and those whose result directory
/// is already claimed by an earlier input, paired with that input.
fn split_colliding_outputs(inputs: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<(PathBuf, PathBuf)>) {
    let mut claimed: HashMap<String, PathBuf> = HashMap::new();
    let mut runnable = Vec::with_capacity(inputs.len());
    let mut duplicates = Vec::new();
    for path in inputs {
        match claimed.entry(result_stem(&path)) {
            Entry::Occupied(owner) => duplicates.push((path, owner.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(path.clone());
                runnable.push(path);
            }
        }
    }
    (runnable, duplicates)
}

/// [`process`] with panics turned into `Failed(internal_error)`
fn process_guarded(path: &Path, output_dir: &Path, config: &PipelineConfig, cancel: &CancellationToken) -> FileRecord {
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| process(path, output_dir, config, cancel)));
    let mut record = outcome.unwrap_or_else(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "worker panicked".to_string());
        let mut record = FileRecord::new(path.to_path_buf());
        fail(&mut record, FailureReason::InternalError, detail);
        record
    });
    record.elapsed_ms = started.elapsed().as_millis() as u64;
    record
}

fn fail(record: &mut FileRecord, reason: FailureReason, detail: impl Into<String>) {
    record.history.advance(FileState::Failed);
    record.status = FileStatus::Failed {
        reason,
        detail: detail.into(),
    };
}

fn reject(record: &mut FileRecord, reason: FailureReason, detail: impl Into<String>) {
    record.history.advance(FileState::Rejected);
    record.status = FileStatus::Rejected {
        reason,
        detail: detail.into(),
    };
}

/// Returns true (after marking the record) when the batch was cancelled
fn cancelled(record: &mut FileRecord, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        debug!("{}: cancelled in state {}", record.file_name, record.state());
        let state = record.state();
        fail(record, FailureReason::Cancelled, format!("cancelled after {}", state));
        true
    } else {
        false
    }
}

fn process(path: &Path, output_dir: &Path, config: &PipelineConfig, cancel: &CancellationToken) -> FileRecord {
    let mut record = FileRecord::new(path.to_path_buf());
    let mut log = ProcessingLog::start(config);
    if cancelled(&mut record, cancel) {
        return record;
    }

    let stage = Instant::now();
    let exploration = explore_path(path);
    log.record_stage("explore", stage.elapsed());
    let schema = exploration.report;
    let file = match (exploration.file, &schema.unreadable) {
        (Some(file), None) => file,
        (_, reason) => {
            let detail = reason.clone().unwrap_or_else(|| "file could not be opened".to_string());
            fail(&mut record, FailureReason::Unreadable, detail);
            return record;
        }
    };
    record.history.advance(FileState::SchemaExplored);
    if cancelled(&mut record, cancel) {
        return record;
    }

    let stage = Instant::now();
    let validation = Validator::new(config.validation.clone()).validate(&file, &schema);
    log.record_stage("validate", stage.elapsed());
    record.history.advance(FileState::Validated);
    record.validation_failures = validation
        .failures()
        .map(|c| format!("{}: {}", c.name, c.detail().unwrap_or_default()))
        .collect();

    if validation.has_fatal_failure_in(CheckCategory::Mandatory) {
        let detail = fatal_detail(&validation, CheckCategory::Mandatory);
        reject(&mut record, FailureReason::MissingMandatoryFields, detail);
        return record;
    }
    if validation.has_fatal_failure_in(CheckCategory::Geographic) {
        let detail = fatal_detail(&validation, CheckCategory::Geographic);
        reject(&mut record, FailureReason::InvalidPosition, detail);
        return record;
    }
    if schema.category == FileCategory::Trajectory {
        reject(
            &mut record,
            FailureReason::UnsupportedFileType,
            "trajectory files carry no vertical profiles",
        );
        return record;
    }
    if cancelled(&mut record, cancel) {
        return record;
    }

    let stage = Instant::now();
    let preprocessed = match Preprocessor::new(config).preprocess(&file, &schema, &validation) {
        Ok(preprocessed) => preprocessed,
        Err(PreprocessError::MissingMandatoryFields(fields)) => {
            reject(&mut record, FailureReason::MissingMandatoryFields, fields.join(", "));
            return record;
        }
        Err(PreprocessError::Unreadable(reason)) => {
            fail(&mut record, FailureReason::Unreadable, reason);
            return record;
        }
        Err(e) => {
            fail(&mut record, FailureReason::PreprocessError, e.to_string());
            return record;
        }
    };
    log.record_stage("preprocess", stage.elapsed());
    record.history.advance(FileState::Preprocessed);
    if cancelled(&mut record, cancel) {
        return record;
    }

    let input = ExportInput {
        file: &file,
        schema: &schema,
        validation: &validation,
        preprocessed: &preprocessed,
    };
    match Exporter::new(config).export(input, output_dir, log) {
        Ok(artifacts) => {
            record.history.advance(FileState::Exported);
            record.output_directory = Some(artifacts.directory);
            record.observations = artifacts.observation_rows;
            record.profiles = artifacts.profile_rows;
            record.history.advance(FileState::Done);
            record.status = FileStatus::Done;
        }
        Err(e) => {
            warn!("{}: export failed: {}", record.file_name, e);
            fail(&mut record, FailureReason::WriteFailed, e.to_string());
        }
    }
    record
}

fn fatal_detail(validation: &crate::validator::ValidationReport, category: CheckCategory) -> String {
    validation
        .failures()
        .filter(|c| c.category == category && c.is_fatal_failure())
        .map(|c| format!("{}: {}", c.name, c.detail().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("; ")
}
