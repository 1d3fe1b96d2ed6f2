//! # Result Reader
//!
//! Reads an exported result directory back into the in-memory tables the
//! preprocessor produced, for verification, downstream tooling and tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use argo_dataops::reader::ResultReader;
//!
//! let reader = ResultReader::open("out/D1900722_001")?;
//! println!("Format version: {}", reader.observations_metadata()?.format_version);
//!
//! let tables = reader.read_tables()?;
//! for profile in tables.profiles.iter() {
//!     println!("{}: {} observations", profile.profile_id, profile.n_observations);
//! }
//! # Ok::<(), argo_dataops::reader::ReaderError>(())
//! ```
//!
//! Measurements written as Float32 are widened back to f64, so values equal
//! the exported `f32` rather than the original `f64`.

mod config;
mod error;
mod metadata;
mod utils;

#[cfg(test)]
mod tests;

pub use config::ReaderConfig;
pub use error::ReaderError;
pub use metadata::TableMetadata;

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::argo::{DataMode, Parameter, QcFlag};
use crate::export::columns::{self, statistic_column, summarized_parameters};
use crate::export::{OBSERVATIONS_FILE, PROCESSING_LOG_FILE, PROFILES_FILE, QUALITY_REPORT_FILE};
use crate::preprocess::{
    ObservationTable, ProcessedObservation, ProfileSummary, ProfileTable, SummaryStats,
};
use utils::*;

/// Both tables of a result directory
#[derive(Debug, Clone, Default)]
pub struct ExportedTables {
    /// Observation table
    pub observations: ObservationTable,
    /// Profile table, statistic counts rebuilt from the observations
    pub profiles: ProfileTable,
}

/// Reader for one `<output_dir>/<stem>/` result directory
#[derive(Debug, Clone)]
pub struct ResultReader {
    directory: PathBuf,
    config: ReaderConfig,
}

impl ResultReader {
    /// Open a result directory
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self, ReaderError> {
        Self::open_with_config(directory, ReaderConfig::default())
    }

    /// Open a result directory with custom configuration
    pub fn open_with_config<P: AsRef<Path>>(directory: P, config: ReaderConfig) -> Result<Self, ReaderError> {
        let directory = directory.as_ref().to_path_buf();
        for name in [OBSERVATIONS_FILE, PROFILES_FILE, QUALITY_REPORT_FILE, PROCESSING_LOG_FILE] {
            if !directory.join(name).is_file() {
                return Err(ReaderError::InvalidFormat(format!(
                    "Result directory missing {}: {}",
                    name,
                    directory.display()
                )));
            }
        }
        Ok(Self { directory, config })
    }

    /// Result directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Footer of `observations.parquet`
    pub fn observations_metadata(&self) -> Result<TableMetadata, ReaderError> {
        TableMetadata::read(self.directory.join(OBSERVATIONS_FILE))
    }

    /// Footer of `profiles.parquet`
    pub fn profiles_metadata(&self) -> Result<TableMetadata, ReaderError> {
        TableMetadata::read(self.directory.join(PROFILES_FILE))
    }

    /// Read the observation table
    pub fn read_observations(&self) -> Result<ObservationTable, ReaderError> {
        read_observations_with(self.directory.join(OBSERVATIONS_FILE), &self.config)
    }

    /// Read the profile table; statistic counts are left at zero
    pub fn read_profiles(&self) -> Result<ProfileTable, ReaderError> {
        read_profiles_with(self.directory.join(PROFILES_FILE), &self.config)
    }

    /// Read both tables, restoring per-profile statistic counts
    pub fn read_tables(&self) -> Result<ExportedTables, ReaderError> {
        let observations = self.read_observations()?;
        let mut profiles = self.read_profiles()?;

        {
            let mut counts: BTreeMap<(&str, Parameter), usize> = BTreeMap::new();
            for row in observations.iter() {
                *counts.entry((row.profile_id.as_str(), row.parameter)).or_default() += 1;
            }
            for profile in &mut profiles.rows {
                for (parameter, stats) in profile.statistics.iter_mut() {
                    stats.count = counts
                        .get(&(profile.profile_id.as_str(), *parameter))
                        .copied()
                        .unwrap_or(0);
                }
            }
        }
        Ok(ExportedTables { observations, profiles })
    }

    /// Parsed `quality_report.json`
    pub fn quality_report(&self) -> Result<serde_json::Value, ReaderError> {
        read_json(&self.directory.join(QUALITY_REPORT_FILE))
    }

    /// Parsed `processing_log.json`
    pub fn processing_log(&self) -> Result<serde_json::Value, ReaderError> {
        read_json(&self.directory.join(PROCESSING_LOG_FILE))
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, ReaderError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

fn read_batches(path: &Path, config: &ReaderConfig) -> Result<Vec<RecordBatch>, ReaderError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?
        .with_batch_size(config.batch_size);
    let reader = builder.build()?;
    reader
        .map(|batch| batch.map_err(ReaderError::from))
        .collect()
}

/// Read an `observations.parquet` file
pub fn read_observations<P: AsRef<Path>>(path: P) -> Result<ObservationTable, ReaderError> {
    read_observations_with(path, &ReaderConfig::default())
}

fn read_observations_with<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<ObservationTable, ReaderError> {
    let mut rows = Vec::new();
    for batch in read_batches(path.as_ref(), config)? {
        let profile_ids = get_string_column(&batch, columns::PROFILE_ID)?;
        let depths = get_float_values(&batch, columns::DEPTH)?;
        let parameters = get_string_column(&batch, columns::PARAMETER)?;
        let values = get_float_values(&batch, columns::VALUE)?;
        let flags = get_int8_column(&batch, columns::QC_FLAG)?;
        let errors = get_float_values(&batch, columns::ADJUSTED_ERROR)?;
        let modes = get_string_column(&batch, columns::DATA_MODE)?;

        for i in 0..batch.num_rows() {
            rows.push(ProcessedObservation {
                profile_id: profile_ids.value(i).to_string(),
                depth: depths[i].ok_or_else(|| null_in(columns::DEPTH))?,
                parameter: parse_parameter(parameters.value(i))?,
                value: values[i].ok_or_else(|| null_in(columns::VALUE))?,
                qc_flag: parse_flag(flags.value(i))?,
                adjusted_error: errors[i],
                data_mode: parse_mode(modes.value(i))?,
            });
        }
    }
    Ok(ObservationTable { rows })
}

/// Read a `profiles.parquet` file; statistic counts are left at zero
pub fn read_profiles<P: AsRef<Path>>(path: P) -> Result<ProfileTable, ReaderError> {
    read_profiles_with(path, &ReaderConfig::default())
}

fn read_profiles_with<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<ProfileTable, ReaderError> {
    let mut rows = Vec::new();
    for batch in read_batches(path.as_ref(), config)? {
        let profile_ids = get_string_column(&batch, columns::PROFILE_ID)?;
        let float_ids = get_string_column(&batch, columns::FLOAT_ID)?;
        let cycles = get_int32_column(&batch, columns::CYCLE_NUMBER)?;
        let directions = get_string_column(&batch, columns::DIRECTION)?;
        let timestamps = get_timestamp_column(&batch, columns::TIMESTAMP)?;
        let latitudes = get_float64_column(&batch, columns::LATITUDE)?;
        let longitudes = get_float64_column(&batch, columns::LONGITUDE)?;
        let position_qc = get_int8_column(&batch, columns::POSITION_QC)?;
        let depth_min = get_float_values(&batch, columns::DEPTH_MIN)?;
        let depth_max = get_float_values(&batch, columns::DEPTH_MAX)?;
        let n_levels = get_int32_column(&batch, columns::N_LEVELS)?;
        let n_observations = get_int32_column(&batch, columns::N_OBSERVATIONS)?;
        let parameter_lists = get_string_column(&batch, columns::PARAMETERS)?;
        let has_bgc = get_boolean_column(&batch, columns::HAS_BIOGEOCHEMICAL)?;
        let modes = get_string_column(&batch, columns::DATA_MODE)?;

        let mut statistic_values = Vec::new();
        for parameter in summarized_parameters() {
            statistic_values.push((
                parameter,
                get_float_values(&batch, &statistic_column(parameter, "min"))?,
                get_float_values(&batch, &statistic_column(parameter, "mean"))?,
                get_float_values(&batch, &statistic_column(parameter, "max"))?,
            ));
        }

        for i in 0..batch.num_rows() {
            let mut statistics = BTreeMap::new();
            for (parameter, min, mean, max) in &statistic_values {
                if let (Some(min), Some(mean), Some(max)) = (min[i], mean[i], max[i]) {
                    statistics.insert(*parameter, SummaryStats { min, mean, max, count: 0 });
                }
            }
            let parameters = parameter_lists
                .value(i)
                .split(',')
                .filter(|name| !name.is_empty())
                .map(parse_parameter)
                .collect::<Result<Vec<_>, _>>()?;
            let timestamp = if timestamps.is_null(i) {
                None
            } else {
                let micros = timestamps.value(i);
                Some(DateTime::from_timestamp_micros(micros).ok_or_else(|| {
                    ReaderError::InvalidFormat(format!("timestamp {} out of range", micros))
                })?)
            };

            rows.push(ProfileSummary {
                profile_id: profile_ids.value(i).to_string(),
                float_id: float_ids.value(i).to_string(),
                cycle_number: get_optional_i32(cycles, i),
                direction: directions.value(i).chars().next().unwrap_or('A'),
                timestamp,
                latitude: latitudes.value(i),
                longitude: longitudes.value(i),
                position_qc: get_optional_i8(position_qc, i).map(parse_flag).transpose()?,
                depth_min: depth_min[i],
                depth_max: depth_max[i],
                n_levels: n_levels.value(i).max(0) as usize,
                n_observations: n_observations.value(i).max(0) as usize,
                parameters,
                statistics,
                has_biogeochemical: has_bgc.value(i),
                data_mode: get_optional_str(modes, i).map(parse_mode).transpose()?,
            });
        }
    }
    Ok(ProfileTable { rows })
}

fn null_in(column: &str) -> ReaderError {
    ReaderError::InvalidFormat(format!("unexpected null in {}", column))
}

fn parse_parameter(name: &str) -> Result<Parameter, ReaderError> {
    Parameter::from_name(name).ok_or_else(|| ReaderError::InvalidFormat(format!("unknown parameter {:?}", name)))
}

fn parse_flag(value: i8) -> Result<QcFlag, ReaderError> {
    u8::try_from(value)
        .ok()
        .and_then(QcFlag::new)
        .ok_or_else(|| ReaderError::InvalidFormat(format!("invalid QC flag {}", value)))
}

fn parse_mode(label: &str) -> Result<DataMode, ReaderError> {
    DataMode::from_label(label).ok_or_else(|| ReaderError::InvalidFormat(format!("unknown data mode {:?}", label)))
}
