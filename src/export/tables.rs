use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float32Builder, Float64Builder, Int32Builder, Int8Builder,
    StringBuilder, TimestampMicrosecondBuilder,
};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::columns::{self, statistic_column, summarized_parameters, STATISTICS};
use super::config::ExportConfig;
use super::error::ExportError;
use crate::preprocess::{ObservationTable, ProfileTable, SummaryStats};

/// Footer metadata of one table, ordered by key
fn table_metadata(table: &str, source_file: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert(columns::KEY_FORMAT_VERSION.to_string(), columns::FORMAT_VERSION.to_string());
    metadata.insert(columns::KEY_TABLE.to_string(), table.to_string());
    metadata.insert(columns::KEY_SOURCE_FILE.to_string(), source_file.to_string());
    metadata
}

/// Measurement column, narrowed to Float32 unless full precision is requested
fn build_measurement_array(values: impl Iterator<Item = Option<f64>>, len: usize, full_precision: bool) -> ArrayRef {
    if full_precision {
        let mut builder = Float64Builder::with_capacity(len);
        for value in values {
            builder.append_option(value);
        }
        Arc::new(builder.finish())
    } else {
        let mut builder = Float32Builder::with_capacity(len);
        for value in values {
            builder.append_option(value.map(|v| v as f32));
        }
        Arc::new(builder.finish())
    }
}

fn build_string_array<'a>(values: impl Iterator<Item = Option<&'a str>>, len: usize) -> ArrayRef {
    let mut builder = StringBuilder::with_capacity(len, len * 8);
    for value in values {
        builder.append_option(value);
    }
    Arc::new(builder.finish())
}

fn build_f32_array(values: impl Iterator<Item = Option<f64>>, len: usize) -> ArrayRef {
    let mut builder = Float32Builder::with_capacity(len);
    for value in values {
        builder.append_option(value.map(|v| v as f32));
    }
    Arc::new(builder.finish())
}

fn build_f64_array(values: impl Iterator<Item = f64>, len: usize) -> ArrayRef {
    let mut builder = Float64Builder::with_capacity(len);
    for value in values {
        builder.append_value(value);
    }
    Arc::new(builder.finish())
}

fn build_i8_array(values: impl Iterator<Item = Option<i8>>, len: usize) -> ArrayRef {
    let mut builder = Int8Builder::with_capacity(len);
    for value in values {
        builder.append_option(value);
    }
    Arc::new(builder.finish())
}

fn build_i32_array(values: impl Iterator<Item = Option<i32>>, len: usize) -> ArrayRef {
    let mut builder = Int32Builder::with_capacity(len);
    for value in values {
        builder.append_option(value);
    }
    Arc::new(builder.finish())
}

/// Record batch of the observation table
pub(super) fn observation_batch(table: &ObservationTable, full_precision: bool) -> Result<RecordBatch, ExportError> {
    let rows = &table.rows;
    let len = rows.len();
    let arrays: Vec<ArrayRef> = vec![
        build_string_array(rows.iter().map(|r| Some(r.profile_id.as_str())), len),
        build_f32_array(rows.iter().map(|r| Some(r.depth)), len),
        build_string_array(rows.iter().map(|r| Some(r.parameter.name())), len),
        build_measurement_array(rows.iter().map(|r| Some(r.value)), len, full_precision),
        build_i8_array(rows.iter().map(|r| Some(r.qc_flag.value() as i8)), len),
        build_measurement_array(rows.iter().map(|r| r.adjusted_error), len, full_precision),
        build_string_array(rows.iter().map(|r| Some(r.data_mode.label())), len),
    ];
    Ok(RecordBatch::try_new(columns::observation_schema_arc(full_precision), arrays)?)
}

/// Record batch of the profile table
pub(super) fn profile_batch(table: &ProfileTable, full_precision: bool) -> Result<RecordBatch, ExportError> {
    let rows = &table.rows;
    let len = rows.len();

    let directions: Vec<String> = rows.iter().map(|r| r.direction.to_string()).collect();
    let parameter_lists: Vec<String> = rows.iter().map(|r| r.parameter_list()).collect();

    let mut timestamps = TimestampMicrosecondBuilder::with_capacity(len).with_timezone("UTC");
    for row in rows {
        timestamps.append_option(row.timestamp.map(|t| t.timestamp_micros()));
    }
    let mut has_bgc = BooleanBuilder::with_capacity(len);
    for row in rows {
        has_bgc.append_value(row.has_biogeochemical);
    }

    let mut arrays: Vec<ArrayRef> = vec![
        build_string_array(rows.iter().map(|r| Some(r.profile_id.as_str())), len),
        build_string_array(rows.iter().map(|r| Some(r.float_id.as_str())), len),
        build_i32_array(rows.iter().map(|r| r.cycle_number), len),
        build_string_array(directions.iter().map(|d| Some(d.as_str())), len),
        Arc::new(timestamps.finish()),
        build_f64_array(rows.iter().map(|r| r.latitude), len),
        build_f64_array(rows.iter().map(|r| r.longitude), len),
        build_i8_array(rows.iter().map(|r| r.position_qc.map(|q| q.value() as i8)), len),
        build_f32_array(rows.iter().map(|r| r.depth_min), len),
        build_f32_array(rows.iter().map(|r| r.depth_max), len),
        build_i32_array(rows.iter().map(|r| Some(r.n_levels as i32)), len),
        build_i32_array(rows.iter().map(|r| Some(r.n_observations as i32)), len),
        build_string_array(parameter_lists.iter().map(|p| Some(p.as_str())), len),
        Arc::new(has_bgc.finish()),
        build_string_array(rows.iter().map(|r| r.data_mode.map(|m| m.label())), len),
    ];

    for parameter in summarized_parameters() {
        for statistic in STATISTICS {
            let pick = |s: &SummaryStats| match statistic {
                "min" => s.min,
                "mean" => s.mean,
                _ => s.max,
            };
            let values = rows
                .iter()
                .map(|r| r.statistics.get(&parameter).map(pick));
            arrays.push(build_measurement_array(values, len, full_precision));
        }
    }

    Ok(RecordBatch::try_new(columns::profile_schema_arc(full_precision), arrays)?)
}

fn write_batch<W: Write + Send>(
    writer: W,
    batch: &RecordBatch,
    config: &ExportConfig,
    dictionary_columns: &[&str],
    float_columns: &[&str],
    metadata: &BTreeMap<String, String>,
) -> Result<(), ExportError> {
    let props = config.to_writer_properties(dictionary_columns, float_columns, metadata);
    let mut arrow_writer = ArrowWriter::try_new(writer, batch.schema(), Some(props))?;
    if batch.num_rows() > 0 {
        arrow_writer.write(batch)?;
    }
    arrow_writer.close()?;
    Ok(())
}

/// Write `observations.parquet`, returning the number of rows
pub(super) fn write_observations(
    path: &Path,
    table: &ObservationTable,
    config: &ExportConfig,
    source_file: &str,
) -> Result<usize, ExportError> {
    let batch = observation_batch(table, config.full_precision_measurements)?;
    let file = BufWriter::new(File::create(path)?);
    write_batch(
        file,
        &batch,
        config,
        &[columns::PROFILE_ID, columns::PARAMETER, columns::DATA_MODE, columns::QC_FLAG],
        &[columns::DEPTH, columns::VALUE, columns::ADJUSTED_ERROR],
        &table_metadata(columns::OBSERVATIONS_TABLE, source_file),
    )?;
    Ok(batch.num_rows())
}

/// Write `profiles.parquet`, returning the number of rows
pub(super) fn write_profiles(
    path: &Path,
    table: &ProfileTable,
    config: &ExportConfig,
    source_file: &str,
) -> Result<usize, ExportError> {
    let batch = profile_batch(table, config.full_precision_measurements)?;
    let float_columns = columns::profile_float_columns();
    let float_refs: Vec<&str> = float_columns.iter().map(String::as_str).collect();
    let file = BufWriter::new(File::create(path)?);
    write_batch(
        file,
        &batch,
        config,
        &[columns::FLOAT_ID, columns::DIRECTION, columns::DATA_MODE, columns::PARAMETERS],
        &float_refs,
        &table_metadata(columns::PROFILES_TABLE, source_file),
    )?;
    Ok(batch.num_rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use crate::argo::{DataMode, Parameter, QcFlag};
    use crate::preprocess::{ProcessedObservation, ProfileSummary};

    fn summary() -> ProfileSummary {
        let mut statistics = BTreeMap::new();
        statistics.insert(
            Parameter::Temp,
            SummaryStats {
                min: 4.5,
                mean: 10.0,
                max: 25.5,
                count: 3,
            },
        );
        ProfileSummary {
            profile_id: "1900722_001".to_string(),
            float_id: "1900722".to_string(),
            cycle_number: Some(1),
            direction: 'A',
            timestamp: None,
            latitude: 12.5,
            longitude: -30.0,
            position_qc: Some(QcFlag::GOOD),
            depth_min: Some(5.0),
            depth_max: Some(100.0),
            n_levels: 3,
            n_observations: 3,
            parameters: vec![Parameter::Temp],
            statistics,
            has_biogeochemical: false,
            data_mode: Some(DataMode::Delayed),
        }
    }

    #[test]
    fn test_profile_batch_matches_schema() {
        let table = ProfileTable { rows: vec![summary()] };
        let batch = profile_batch(&table, false).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), columns::profile_schema(false).fields().len());

        let index = batch.schema().index_of(&statistic_column(Parameter::Temp, "max")).unwrap();
        let max = batch
            .column(index)
            .as_any()
            .downcast_ref::<arrow::array::Float32Array>()
            .unwrap();
        assert_eq!(max.value(0), 25.5);
        let doxy = batch.schema().index_of("doxy_mean").unwrap();
        assert!(batch.column(doxy).is_null(0));
    }

    #[test]
    fn test_observation_batch_precision() {
        let table = ObservationTable {
            rows: vec![ProcessedObservation {
                profile_id: "1900722_001".to_string(),
                depth: 9.94,
                parameter: Parameter::Temp,
                value: 14.8,
                qc_flag: QcFlag::GOOD,
                adjusted_error: None,
                data_mode: DataMode::Delayed,
            }],
        };
        let narrow = observation_batch(&table, false).unwrap();
        let value = narrow
            .column(3)
            .as_any()
            .downcast_ref::<arrow::array::Float32Array>()
            .unwrap();
        assert_eq!(value.value(0), 14.8f32);
        assert!(narrow.column(5).is_null(0));

        let full = observation_batch(&table, true).unwrap();
        let value = full
            .column(3)
            .as_any()
            .downcast_ref::<arrow::array::Float64Array>()
            .unwrap();
        assert_eq!(value.value(0), 14.8);
    }
}
