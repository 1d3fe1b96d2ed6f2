//! TOML configuration file support.
//!
//! Every section and every field is optional; anything left out keeps its
//! default. Command-line flags are applied on top of the file.
//!
//! ```toml
//! # argo-dataops.toml
//! [validation]
//! reject_invalid_position = true
//! temperature = { min = -2.5, max = 40.0 }
//!
//! [qc]
//! preset = "relaxed"
//! drop_out_of_range = false
//!
//! [preprocessing]
//! depth_method = "linear"
//!
//! [export]
//! row_group_size = 200000
//! full_precision_measurements = true
//!
//! [batch]
//! workers = 2
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use argo_dataops::argo::DepthMethod;
use argo_dataops::config::{PipelineConfig, QcPolicy, ValidationBounds};
use argo_dataops::export::ExportConfig;

/// Named QC policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QcPreset {
    /// Flags 1 and 2
    Preferred,
    /// Everything except 4 and 9
    Relaxed,
}

/// Root configuration structure for argo-dataops.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validator bounds and flag vocabulary.
    pub validation: ValidationBounds,
    /// QC filtering.
    pub qc: QcSection,
    /// Preprocessing settings.
    pub preprocessing: PreprocessingSection,
    /// Parquet output settings.
    pub export: ExportConfig,
    /// Batch execution settings.
    pub batch: BatchSection,
}

/// `[qc]` section.
#[derive(Debug, Default, Deserialize)]
pub struct QcSection {
    /// Starting policy, `preferred` when omitted.
    pub preset: Option<QcPreset>,
    /// Replaces the preset's accepted flags.
    pub accepted_flags: Option<Vec<u8>>,
    /// Replaces the preset's out-of-range handling.
    pub drop_out_of_range: Option<bool>,
}

/// `[preprocessing]` section.
#[derive(Debug, Default, Deserialize)]
pub struct PreprocessingSection {
    /// Depth derivation method.
    pub depth_method: Option<DepthMethod>,
}

/// `[batch]` section.
#[derive(Debug, Default, Deserialize)]
pub struct BatchSection {
    /// Files processed concurrently.
    pub workers: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Pipeline configuration described by the file.
    pub fn into_pipeline_config(self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        let mut qc = match self.qc.preset {
            Some(QcPreset::Relaxed) => QcPolicy::relaxed(),
            Some(QcPreset::Preferred) | None => QcPolicy::preferred(),
        };
        if let Some(flags) = self.qc.accepted_flags {
            qc.accepted_flags = flags;
        }
        if let Some(drop) = self.qc.drop_out_of_range {
            qc.drop_out_of_range = drop;
        }
        PipelineConfig {
            validation: self.validation,
            qc,
            depth_method: self.preprocessing.depth_method.unwrap_or(defaults.depth_method),
            export: self.export,
            workers: self.batch.workers.unwrap_or(defaults.workers),
        }
    }
}
