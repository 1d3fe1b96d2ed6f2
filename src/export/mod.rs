//! # Exporter
//!
//! Fourth pipeline stage. Writes the cleaned tables of one input file as
//! Parquet, together with a JSON quality report and a JSON processing log.
//!
//! ## Output Layout
//!
//! ```text
//! <output_dir>/<file-stem>/
//! ├── observations.parquet    # one row per (profile, level, parameter)
//! ├── profiles.parquet        # one row per profile
//! ├── quality_report.json     # QualityReport
//! └── processing_log.json     # ProcessingLog
//! ```
//!
//! All four artifacts are written into a hidden staging directory next to the
//! target and renamed into place in one step, so readers never observe a
//! partially written result. A previous result for the same stem is replaced,
//! and restored if the new one cannot be moved into place.
//!
//! ## Column Types
//!
//! | Column | Type |
//! |--------|------|
//! | `profile_id`, `parameter`, `data_mode` | Utf8, dictionary-encoded |
//! | `depth` | Float32 |
//! | `value`, `adjusted_error` | Float32 (Float64 with `full_precision_measurements`) |
//! | `qc_flag` | Int8 |
//! | `latitude`, `longitude` | Float64 |
//! | `timestamp` | Timestamp(µs, UTC) |

pub mod columns;
mod config;
mod error;
mod report;
mod tables;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

pub use config::{CompressionType, ExportConfig};
pub use error::ExportError;
pub use report::{
    CoordinateBounds, ParameterQuality, ProcessingLog, QualityReport, Software, SourceProvenance,
    ValidationSummary,
};

use crate::config::PipelineConfig;
use crate::preprocess::Preprocessed;
use crate::schema::{RawInstrumentFile, SchemaReport};
use crate::validator::ValidationReport;

/// Observation table file name
pub const OBSERVATIONS_FILE: &str = "observations.parquet";
/// Profile table file name
pub const PROFILES_FILE: &str = "profiles.parquet";
/// Quality report file name
pub const QUALITY_REPORT_FILE: &str = "quality_report.json";
/// Processing log file name
pub const PROCESSING_LOG_FILE: &str = "processing_log.json";

/// Everything the exporter needs to know about one processed file
#[derive(Debug, Clone, Copy)]
pub struct ExportInput<'a> {
    /// Source file
    pub file: &'a RawInstrumentFile,
    /// Schema report of the source file
    pub schema: &'a SchemaReport,
    /// Validation report of the source file
    pub validation: &'a ValidationReport,
    /// Cleaned tables
    pub preprocessed: &'a Preprocessed,
}

/// Paths and summary of a written result
#[derive(Debug, Clone)]
pub struct ExportArtifacts {
    /// Result directory
    pub directory: PathBuf,
    /// `observations.parquet`
    pub observations: PathBuf,
    /// `profiles.parquet`
    pub profiles: PathBuf,
    /// `quality_report.json`
    pub quality_report_path: PathBuf,
    /// `processing_log.json`
    pub processing_log_path: PathBuf,
    /// Rows written to the observation table
    pub observation_rows: usize,
    /// Rows written to the profile table
    pub profile_rows: usize,
    /// The written quality report
    pub quality: QualityReport,
}

/// Writes result directories
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: PipelineConfig,
}

impl Exporter {
    /// Create an exporter
    pub fn new(config: &PipelineConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Output settings in use
    pub fn export_config(&self) -> &ExportConfig {
        &self.config.export
    }

    /// Directory a file's results are written to
    pub fn result_dir(output_dir: &Path, file: &RawInstrumentFile) -> PathBuf {
        output_dir.join(file.stem())
    }

    /// Write the four artifacts of one file into `<output_dir>/<stem>/`.
    ///
    /// `log` is completed with provenance, warnings and the export timing
    /// before it is written.
    pub fn export(
        &self,
        input: ExportInput<'_>,
        output_dir: &Path,
        mut log: ProcessingLog,
    ) -> Result<ExportArtifacts, ExportError> {
        let started = std::time::Instant::now();
        let stem = input.file.stem();
        if stem.is_empty() || stem.starts_with('.') {
            return Err(ExportError::InvalidOutput(format!(
                "cannot derive a result directory from {:?}",
                input.file.name()
            )));
        }
        let source_name = input.file.name().to_string();
        let quality = QualityReport::new(input.schema, input.validation, input.preprocessed, &self.config);
        let export = &self.config.export;

        fs::create_dir_all(output_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{stem}."))
            .tempdir_in(output_dir)?;
        let staged = staging.path();

        let observation_rows = tables::write_observations(
            &staged.join(OBSERVATIONS_FILE),
            &input.preprocessed.observations,
            export,
            &source_name,
        )?;
        let profile_rows = tables::write_profiles(
            &staged.join(PROFILES_FILE),
            &input.preprocessed.profiles,
            export,
            &source_name,
        )?;
        fs::write(staged.join(QUALITY_REPORT_FILE), serde_json::to_vec_pretty(&quality)?)?;

        log.set_source(input.file, input.schema);
        log.collect_warnings(input.schema, input.validation, &input.preprocessed.notes);
        log.record_stage("export", started.elapsed());
        log.finish();
        fs::write(staged.join(PROCESSING_LOG_FILE), serde_json::to_vec_pretty(&log)?)?;

        let directory = output_dir.join(stem);
        replace_dir(staged, &directory, output_dir, stem)?;
        debug!("{}: artifacts moved into {}", source_name, directory.display());
        info!(
            "{}: wrote {} observations and {} profiles to {}",
            source_name,
            observation_rows,
            profile_rows,
            directory.display()
        );

        Ok(ExportArtifacts {
            observations: directory.join(OBSERVATIONS_FILE),
            profiles: directory.join(PROFILES_FILE),
            quality_report_path: directory.join(QUALITY_REPORT_FILE),
            processing_log_path: directory.join(PROCESSING_LOG_FILE),
            directory,
            observation_rows,
            profile_rows,
            quality,
        })
    }
}

/// Move `staged` to `target`, retiring any previous `target` first.
///
/// The retired directory lives in a temporary sibling that is deleted on drop.
/// When the final rename fails the previous result is moved back, so a failed
/// export leaves the last good result in place.
fn replace_dir(staged: &Path, target: &Path, output_dir: &Path, stem: &str) -> Result<(), ExportError> {
    if target.exists() && !target.is_dir() {
        return Err(ExportError::InvalidOutput(format!(
            "{} exists and is not a directory",
            target.display()
        )));
    }
    let retired = tempfile::Builder::new()
        .prefix(&format!(".{stem}.old."))
        .tempdir_in(output_dir)?;
    let previous = retired.path().join(stem);
    let had_previous = target.exists();
    if had_previous {
        fs::rename(target, &previous)?;
    }
    if let Err(err) = fs::rename(staged, target) {
        if had_previous {
            if let Err(restore) = fs::rename(&previous, target) {
                // Keep the retired copy on disk rather than deleting the only good result
                let kept = retired.into_path();
                warn!(
                    "{}: could not restore previous result ({}), kept at {}",
                    target.display(),
                    restore,
                    kept.join(stem).display()
                );
            }
        }
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argo::FileCategory;
    use crate::netcdf::NcFile;
    use crate::preprocess::Preprocessor;
    use crate::schema::explore;
    use crate::synthetic::SyntheticFile;
    use crate::validator::Validator;

    fn export_demo(output_dir: &Path, config: &PipelineConfig) -> ExportArtifacts {
        let nc = NcFile::from_bytes(SyntheticFile::demo(FileCategory::Core, 2, 20).to_bytes().unwrap()).unwrap();
        let file = RawInstrumentFile::from_netcdf("D1900722_001.nc", nc);
        let schema = explore(&file);
        let validation = Validator::new(config.validation.clone()).validate(&file, &schema);
        let preprocessed = Preprocessor::new(config).preprocess(&file, &schema, &validation).unwrap();
        let input = ExportInput {
            file: &file,
            schema: &schema,
            validation: &validation,
            preprocessed: &preprocessed,
        };
        Exporter::new(config)
            .export(input, output_dir, ProcessingLog::start(config))
            .unwrap()
    }

    #[test]
    fn test_export_layout() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = export_demo(dir.path(), &PipelineConfig::default());

        assert_eq!(artifacts.directory, dir.path().join("D1900722_001"));
        for path in [
            &artifacts.observations,
            &artifacts.profiles,
            &artifacts.quality_report_path,
            &artifacts.processing_log_path,
        ] {
            assert!(path.is_file(), "{} missing", path.display());
        }
        // Only the result directory remains; staging directories are gone
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);

        assert_eq!(artifacts.profile_rows, 2);
        assert_eq!(artifacts.quality.observations_kept as usize, artifacts.observation_rows);
        assert_eq!(artifacts.quality.depth_method, "unesco1983");
    }

    #[test]
    fn test_reports_are_json() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = export_demo(dir.path(), &PipelineConfig::default());

        let quality: serde_json::Value =
            serde_json::from_slice(&fs::read(&artifacts.quality_report_path).unwrap()).unwrap();
        assert_eq!(quality["qc_policy"], "preferred");
        assert_eq!(quality["parameters_included"], serde_json::json!(["TEMP", "PSAL"]));
        assert_eq!(quality["dropped_by_reason"]["qc_flag"], 8);
        assert!(quality["parameters"]["TEMP"]["completeness"].as_f64().unwrap() > 0.99);
        assert_eq!(quality["completeness"]["PSAL"], quality["parameters"]["PSAL"]["completeness"]);
        assert_eq!(quality["qc_summary"]["TEMP"]["1"], 36);
        assert_eq!(quality["qc_summary"]["TEMP"]["4"], 2);
        assert!(quality["validation"]["checks"][0]["check_name"].is_string());

        let log: serde_json::Value =
            serde_json::from_slice(&fs::read(&artifacts.processing_log_path).unwrap()).unwrap();
        assert_eq!(log["software"]["name"], "argo-dataops");
        assert_eq!(log["source"]["file_name"], "D1900722_001.nc");
        assert!(log["stage_timings_ms"]["export"].is_u64());
        assert!(log["finished_at"].is_string());
    }

    #[test]
    fn test_existing_result_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("D1900722_001");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("leftover.txt"), b"old").unwrap();

        export_demo(dir.path(), &PipelineConfig::default());
        assert!(!stale.join("leftover.txt").exists());
        assert!(stale.join(OBSERVATIONS_FILE).is_file());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_rename_restores_previous_result() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("D1900722_001");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join(OBSERVATIONS_FILE), b"previous").unwrap();
        let missing = dir.path().join(".D1900722_001.staged");

        let err = replace_dir(&missing, &target, dir.path(), "D1900722_001").unwrap_err();
        assert!(matches!(err, ExportError::Io(_)), "{err}");
        assert_eq!(fs::read(target.join(OBSERVATIONS_FILE)).unwrap(), b"previous");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_in_place_of_result_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("D1900722_001");
        fs::write(&blocker, b"not a directory").unwrap();
        let staged = tempfile::tempdir_in(dir.path()).unwrap();

        let err = replace_dir(staged.path(), &blocker, dir.path(), "D1900722_001").unwrap_err();
        assert!(matches!(err, ExportError::InvalidOutput(_)), "{err}");
        assert!(blocker.is_file());
    }
}
