//! Column names and Arrow schemas of the exported tables.
//!
//! Downstream loaders map columns by these names; they are part of the
//! public contract and only ever grow.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaBuilder, TimeUnit};

use crate::argo::Parameter;

/// Version of the table layout, written to every file footer
pub const FORMAT_VERSION: &str = "1.0";
/// Footer key holding [`FORMAT_VERSION`]
pub const KEY_FORMAT_VERSION: &str = "argo_dataops:format_version";
/// Footer key holding the table name
pub const KEY_TABLE: &str = "argo_dataops:table";
/// Footer key holding the source file name
pub const KEY_SOURCE_FILE: &str = "argo_dataops:source_file";

/// Observation table name
pub const OBSERVATIONS_TABLE: &str = "observations";
/// Profile table name
pub const PROFILES_TABLE: &str = "profiles";

// Observation table

/// Owning profile (foreign key)
pub const PROFILE_ID: &str = "profile_id";
/// Depth in metres
pub const DEPTH: &str = "depth";
/// Parameter name (`TEMP`, `PSAL`, `DOXY`, ...)
pub const PARAMETER: &str = "parameter";
/// Authoritative value
pub const VALUE: &str = "value";
/// ARGO QC flag (0-9)
pub const QC_FLAG: &str = "qc_flag";
/// Adjusted-value uncertainty
pub const ADJUSTED_ERROR: &str = "adjusted_error";
/// `real-time`, `adjusted` or `delayed`
pub const DATA_MODE: &str = "data_mode";

// Profile table

/// WMO platform number
pub const FLOAT_ID: &str = "float_id";
/// Cycle number
pub const CYCLE_NUMBER: &str = "cycle_number";
/// `A` or `D`
pub const DIRECTION: &str = "direction";
/// Profile time, UTC
pub const TIMESTAMP: &str = "timestamp";
/// Degrees north
pub const LATITUDE: &str = "latitude";
/// Degrees east
pub const LONGITUDE: &str = "longitude";
/// Position QC flag
pub const POSITION_QC: &str = "position_qc";
/// Shallowest kept depth
pub const DEPTH_MIN: &str = "depth_min";
/// Deepest kept depth
pub const DEPTH_MAX: &str = "depth_max";
/// Occupied levels
pub const N_LEVELS: &str = "n_levels";
/// Kept observations
pub const N_OBSERVATIONS: &str = "n_observations";
/// Comma-joined parameter names
pub const PARAMETERS: &str = "parameters";
/// Any biogeochemical parameter present
pub const HAS_BIOGEOCHEMICAL: &str = "has_biogeochemical";

/// Statistic suffixes of the per-parameter profile columns
pub const STATISTICS: [&str; 3] = ["min", "mean", "max"];

/// Parameters with statistic columns in the profile table (all but pressure)
pub fn summarized_parameters() -> impl Iterator<Item = Parameter> {
    Parameter::ALL.into_iter().filter(|p| *p != Parameter::Pres)
}

/// Name of a per-parameter statistic column, e.g. `temp_mean`
pub fn statistic_column(parameter: Parameter, statistic: &str) -> String {
    format!("{}_{}", parameter.column_prefix(), statistic)
}

/// Creates a field carrying a `units` annotation
fn field_with_units(name: &str, data_type: DataType, nullable: bool, units: &str) -> Field {
    let mut metadata = HashMap::new();
    metadata.insert("units".to_string(), units.to_string());
    Field::new(name, data_type, nullable).with_metadata(metadata)
}

fn measurement_type(full_precision: bool) -> DataType {
    if full_precision {
        DataType::Float64
    } else {
        DataType::Float32
    }
}

/// Arrow schema of the observation table.
///
/// ```
/// use argo_dataops::export::columns;
///
/// let schema = columns::observation_schema(false);
/// assert_eq!(schema.fields().len(), 7);
/// assert_eq!(schema.field(0).name(), columns::PROFILE_ID);
/// ```
pub fn observation_schema(full_precision: bool) -> Schema {
    let measurement = measurement_type(full_precision);
    let mut builder = SchemaBuilder::new();
    builder.push(Field::new(PROFILE_ID, DataType::Utf8, false));
    builder.push(field_with_units(DEPTH, DataType::Float32, false, "m"));
    builder.push(Field::new(PARAMETER, DataType::Utf8, false));
    // Units depend on the parameter row
    builder.push(Field::new(VALUE, measurement.clone(), false));
    builder.push(Field::new(QC_FLAG, DataType::Int8, false));
    builder.push(Field::new(ADJUSTED_ERROR, measurement, true));
    builder.push(Field::new(DATA_MODE, DataType::Utf8, false));
    builder.finish()
}

/// Arrow schema of the observation table (Arc-wrapped)
pub fn observation_schema_arc(full_precision: bool) -> Arc<Schema> {
    Arc::new(observation_schema(full_precision))
}

/// Arrow schema of the profile table.
///
/// Fixed columns are followed by `<param>_min`, `<param>_mean` and
/// `<param>_max` for every known parameter except pressure, in
/// [`Parameter::ALL`] order.
pub fn profile_schema(full_precision: bool) -> Schema {
    let measurement = measurement_type(full_precision);
    let mut builder = SchemaBuilder::new();
    builder.push(Field::new(PROFILE_ID, DataType::Utf8, false));
    builder.push(Field::new(FLOAT_ID, DataType::Utf8, false));
    builder.push(Field::new(CYCLE_NUMBER, DataType::Int32, true));
    builder.push(Field::new(DIRECTION, DataType::Utf8, false));
    builder.push(Field::new(
        TIMESTAMP,
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        true,
    ));
    builder.push(field_with_units(LATITUDE, DataType::Float64, false, "degree_north"));
    builder.push(field_with_units(LONGITUDE, DataType::Float64, false, "degree_east"));
    builder.push(Field::new(POSITION_QC, DataType::Int8, true));
    builder.push(field_with_units(DEPTH_MIN, DataType::Float32, true, "m"));
    builder.push(field_with_units(DEPTH_MAX, DataType::Float32, true, "m"));
    builder.push(Field::new(N_LEVELS, DataType::Int32, false));
    builder.push(Field::new(N_OBSERVATIONS, DataType::Int32, false));
    builder.push(Field::new(PARAMETERS, DataType::Utf8, false));
    builder.push(Field::new(HAS_BIOGEOCHEMICAL, DataType::Boolean, false));
    builder.push(Field::new(DATA_MODE, DataType::Utf8, true));
    for parameter in summarized_parameters() {
        for statistic in STATISTICS {
            builder.push(field_with_units(
                &statistic_column(parameter, statistic),
                measurement.clone(),
                true,
                parameter.units(),
            ));
        }
    }
    builder.finish()
}

/// Arrow schema of the profile table (Arc-wrapped)
pub fn profile_schema_arc(full_precision: bool) -> Arc<Schema> {
    Arc::new(profile_schema(full_precision))
}

/// Float columns of the profile table
pub(super) fn profile_float_columns() -> Vec<String> {
    let mut columns = vec![LATITUDE.to_string(), LONGITUDE.to_string(), DEPTH_MIN.to_string(), DEPTH_MAX.to_string()];
    for parameter in summarized_parameters() {
        for statistic in STATISTICS {
            columns.push(statistic_column(parameter, statistic));
        }
    }
    columns
}
