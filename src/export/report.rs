use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::argo::{FileCategory, Parameter};
use crate::config::PipelineConfig;
use crate::preprocess::{DropReason, ParameterFilterStats, Preprocessed, QualityNote};
use crate::schema::{FilenameHint, RawInstrumentFile, SchemaReport};
use crate::validator::{CheckStatus, QcHistogram, ValidationCheck, ValidationReport};

/// Per-parameter section of the quality report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterQuality {
    /// Non-fill share of the examined levels
    pub completeness: f64,
    /// Filtering counters
    #[serde(flatten)]
    pub stats: ParameterFilterStats,
}

/// Spatial and temporal extent of the exported profiles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateBounds {
    /// Southernmost latitude
    pub latitude_min: f64,
    /// Northernmost latitude
    pub latitude_max: f64,
    /// Westernmost longitude
    pub longitude_min: f64,
    /// Easternmost longitude
    pub longitude_max: f64,
    /// Earliest profile time
    pub time_start: Option<DateTime<Utc>>,
    /// Latest profile time
    pub time_end: Option<DateTime<Utc>>,
}

/// Validation outcome carried into the quality report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    /// Checks that passed (warnings included)
    pub passed: usize,
    /// Checks that failed
    pub failed: usize,
    /// Every check in run order
    pub checks: Vec<ValidationCheck>,
    /// Flag distribution per per-level variable
    pub qc_histogram: QcHistogram,
}

/// Machine-readable data-quality summary of one exported file.
///
/// Holds no wall-clock values, so identical inputs give identical reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// Source file name
    pub source_file: String,
    /// Detected file category
    pub file_category: FileCategory,
    /// QC policy label (`preferred`, `relaxed`, `custom[..]`)
    pub qc_policy: String,
    /// Flags kept by the policy
    pub accepted_flags: Vec<u8>,
    /// Depth derivation method
    pub depth_method: String,
    /// Profiles in the file
    pub profiles_total: usize,
    /// Profiles written to the profile table
    pub profiles_exported: usize,
    /// Profiles skipped
    pub profiles_skipped: usize,
    /// Non-fill values considered
    pub observations_candidates: u64,
    /// Observations written
    pub observations_kept: u64,
    /// Observations excluded
    pub observations_dropped: u64,
    /// Exclusions by reason
    pub dropped_by_reason: BTreeMap<DropReason, u64>,
    /// Parameters with at least one written observation
    pub parameters_included: Vec<Parameter>,
    /// Non-fill share of the examined levels, per parameter
    pub completeness: BTreeMap<Parameter, f64>,
    /// Flag distribution of the candidate observations, per parameter
    pub qc_summary: BTreeMap<Parameter, BTreeMap<String, u64>>,
    /// Per-parameter completeness and counters
    pub parameters: BTreeMap<Parameter, ParameterQuality>,
    /// Extent of the exported profiles
    pub coordinate_bounds: Option<CoordinateBounds>,
    /// Validation outcome
    pub validation: ValidationSummary,
    /// Soft findings of the preprocessing stage
    pub notes: Vec<QualityNote>,
}

impl QualityReport {
    /// Assemble the report of one file
    pub fn new(
        schema: &SchemaReport,
        validation: &ValidationReport,
        preprocessed: &Preprocessed,
        config: &PipelineConfig,
    ) -> Self {
        let stats = &preprocessed.stats;
        let parameters: BTreeMap<Parameter, ParameterQuality> = stats
            .parameters
            .iter()
            .map(|(parameter, s)| {
                (
                    *parameter,
                    ParameterQuality {
                        completeness: s.completeness(),
                        stats: s.clone(),
                    },
                )
            })
            .collect();
        let parameters_included = stats
            .parameters
            .iter()
            .filter(|(_, s)| s.kept > 0)
            .map(|(p, _)| *p)
            .collect();

        Self {
            source_file: schema.file_name.clone(),
            file_category: schema.category,
            qc_policy: config.qc.label(),
            accepted_flags: config.qc.accepted_flags.clone(),
            depth_method: config.depth_method.name().to_string(),
            profiles_total: stats.profiles_total,
            profiles_exported: preprocessed.profiles.len(),
            profiles_skipped: stats.profiles_skipped,
            observations_candidates: stats.candidates(),
            observations_kept: stats.kept(),
            observations_dropped: stats.dropped(),
            dropped_by_reason: stats.dropped_by_reason(),
            parameters_included,
            completeness: parameters.iter().map(|(p, q)| (*p, q.completeness)).collect(),
            qc_summary: stats
                .parameters
                .iter()
                .map(|(p, s)| (*p, s.qc_flags.clone()))
                .collect(),
            parameters,
            coordinate_bounds: coordinate_bounds(preprocessed),
            validation: ValidationSummary {
                passed: validation.passed,
                failed: validation.failed,
                checks: validation.checks.clone(),
                qc_histogram: validation.qc_histogram.clone(),
            },
            notes: preprocessed.notes.clone(),
        }
    }
}

fn coordinate_bounds(preprocessed: &Preprocessed) -> Option<CoordinateBounds> {
    let mut rows = preprocessed.profiles.iter();
    let first = rows.next()?;
    let mut bounds = CoordinateBounds {
        latitude_min: first.latitude,
        latitude_max: first.latitude,
        longitude_min: first.longitude,
        longitude_max: first.longitude,
        time_start: first.timestamp,
        time_end: first.timestamp,
    };
    for row in rows {
        bounds.latitude_min = bounds.latitude_min.min(row.latitude);
        bounds.latitude_max = bounds.latitude_max.max(row.latitude);
        bounds.longitude_min = bounds.longitude_min.min(row.longitude);
        bounds.longitude_max = bounds.longitude_max.max(row.longitude);
        if let Some(t) = row.timestamp {
            bounds.time_start = Some(bounds.time_start.map_or(t, |s| s.min(t)));
            bounds.time_end = Some(bounds.time_end.map_or(t, |e| e.max(t)));
        }
    }
    Some(bounds)
}

/// Where a processed file came from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceProvenance {
    /// File name
    pub file_name: String,
    /// Path as given
    pub path: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Detected category
    pub category: Option<FileCategory>,
    /// Container format
    pub format: Option<String>,
    /// What the file name claims
    pub filename_hint: Option<FilenameHint>,
}

/// Name and version of the producing software
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Software {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
}

impl Default for Software {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Run record of one processed file: timings, provenance and warnings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingLog {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Processing start
    pub started_at: DateTime<Utc>,
    /// Processing end, set when the log is written
    pub finished_at: Option<DateTime<Utc>>,
    /// Milliseconds spent per stage
    pub stage_timings_ms: BTreeMap<String, u64>,
    /// Source file
    pub source: SourceProvenance,
    /// Warnings collected from every stage
    pub warnings: Vec<String>,
    /// Producing software
    pub software: Software,
    /// Configuration in effect
    pub config: PipelineConfig,
}

impl ProcessingLog {
    /// Start a new log now
    pub fn start(config: &PipelineConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            stage_timings_ms: BTreeMap::new(),
            source: SourceProvenance::default(),
            warnings: Vec::new(),
            software: Software::default(),
            config: config.clone(),
        }
    }

    /// Record the time spent in a stage
    pub fn record_stage(&mut self, stage: &str, elapsed: Duration) {
        self.stage_timings_ms
            .insert(stage.to_string(), elapsed.as_millis() as u64);
    }

    /// Record where the file came from
    pub fn set_source(&mut self, file: &RawInstrumentFile, schema: &SchemaReport) {
        self.source = SourceProvenance {
            file_name: file.name().to_string(),
            path: file.path().display().to_string(),
            size_bytes: schema.size_bytes,
            category: Some(schema.category),
            format: schema.format.clone(),
            filename_hint: schema.filename_hint.clone(),
        };
    }

    /// Collect schema warnings, soft validation failures and quality notes
    pub fn collect_warnings(&mut self, schema: &SchemaReport, validation: &ValidationReport, notes: &[QualityNote]) {
        self.warnings
            .extend(schema.warnings.iter().map(|w| format!("schema: {w}")));
        for check in &validation.checks {
            match &check.status {
                CheckStatus::Ok => {}
                CheckStatus::Warning(msg) | CheckStatus::Failed(msg) => {
                    self.warnings.push(format!("validation: {}: {}", check.name, msg));
                }
            }
        }
        self.warnings
            .extend(notes.iter().map(|n| format!("preprocess: {}", n.message)));
    }

    /// Mark the log as finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
