use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::Schema;
use parquet::file::reader::{FileReader, SerializedFileReader};

use crate::export::columns::{KEY_FORMAT_VERSION, KEY_SOURCE_FILE, KEY_TABLE};

use super::ReaderError;

/// Footer information of an exported table
#[derive(Debug, Clone)]
pub struct TableMetadata {
    /// Table layout version
    pub format_version: String,
    /// `observations` or `profiles`
    pub table: String,
    /// Name of the NetCDF file the table came from
    pub source_file: String,
    /// Total number of rows
    pub total_rows: i64,
    /// Number of row groups
    pub num_row_groups: usize,
    /// Schema of the Parquet file
    pub schema: Arc<Schema>,
    /// Raw key-value metadata from the Parquet footer
    pub key_value_metadata: BTreeMap<String, String>,
}

impl TableMetadata {
    /// Read the footer of a Parquet file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        let reader = SerializedFileReader::new(File::open(path)?)?;
        let parquet_metadata = reader.metadata();
        let file_meta = parquet_metadata.file_metadata();
        let schema = parquet::arrow::parquet_to_arrow_schema(
            file_meta.schema_descr(),
            file_meta.key_value_metadata(),
        )?;

        let mut kv_metadata = BTreeMap::new();
        if let Some(kv_list) = file_meta.key_value_metadata() {
            for kv in kv_list {
                if let Some(value) = &kv.value {
                    kv_metadata.insert(kv.key.clone(), value.clone());
                }
            }
        }

        let lookup = |key: &str| kv_metadata.get(key).cloned().unwrap_or_else(|| "unknown".to_string());
        let total_rows: i64 = (0..parquet_metadata.num_row_groups())
            .map(|i| parquet_metadata.row_group(i).num_rows())
            .sum();

        Ok(Self {
            format_version: lookup(KEY_FORMAT_VERSION),
            table: lookup(KEY_TABLE),
            source_file: lookup(KEY_SOURCE_FILE),
            total_rows,
            num_row_groups: parquet_metadata.num_row_groups(),
            schema: Arc::new(schema),
            key_value_metadata: kv_metadata,
        })
    }
}
