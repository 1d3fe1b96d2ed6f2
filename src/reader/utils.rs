use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int8Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::record_batch::RecordBatch;

use super::ReaderError;

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a dyn Array, ReaderError> {
    batch
        .column_by_name(name)
        .map(|c| c.as_ref())
        .ok_or_else(|| ReaderError::ColumnNotFound(name.to_string()))
}

/// Get a required String column by name.
pub(super) fn get_string_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a StringArray, ReaderError> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ReaderError::InvalidFormat(format!("{} is not String", name)))
}

/// Get a required Int8 column by name.
pub(super) fn get_int8_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a Int8Array, ReaderError> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<Int8Array>()
        .ok_or_else(|| ReaderError::InvalidFormat(format!("{} is not Int8", name)))
}

/// Get a required Int32 column by name.
pub(super) fn get_int32_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a Int32Array, ReaderError> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| ReaderError::InvalidFormat(format!("{} is not Int32", name)))
}

/// Get a required Float64 column by name.
pub(super) fn get_float64_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a Float64Array, ReaderError> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ReaderError::InvalidFormat(format!("{} is not Float64", name)))
}

/// Get a required Boolean column by name.
pub(super) fn get_boolean_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a BooleanArray, ReaderError> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| ReaderError::InvalidFormat(format!("{} is not Boolean", name)))
}

/// Get a required UTC microsecond timestamp column by name.
pub(super) fn get_timestamp_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a TimestampMicrosecondArray, ReaderError> {
    column(batch, name)?
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .ok_or_else(|| ReaderError::InvalidFormat(format!("{} is not Timestamp(µs)", name)))
}

/// Read a floating-point column widened to f64, whether stored as Float32 or Float64.
pub(super) fn get_float_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<f64>>, ReaderError> {
    let array = column(batch, name)?;
    if let Some(narrow) = array.as_any().downcast_ref::<Float32Array>() {
        Ok(narrow.iter().map(|v| v.map(f64::from)).collect())
    } else if let Some(wide) = array.as_any().downcast_ref::<Float64Array>() {
        Ok(wide.iter().collect())
    } else {
        Err(ReaderError::InvalidFormat(format!("{} is not a float column", name)))
    }
}

/// Read an optional i32 value from a nullable array.
pub(super) fn get_optional_i32(array: &Int32Array, idx: usize) -> Option<i32> {
    if array.is_null(idx) {
        None
    } else {
        Some(array.value(idx))
    }
}

/// Read an optional i8 value from a nullable array.
pub(super) fn get_optional_i8(array: &Int8Array, idx: usize) -> Option<i8> {
    if array.is_null(idx) {
        None
    } else {
        Some(array.value(idx))
    }
}

/// Read an optional string value from a nullable array.
pub(super) fn get_optional_str(array: &StringArray, idx: usize) -> Option<&str> {
    if array.is_null(idx) {
        None
    } else {
        Some(array.value(idx))
    }
}
