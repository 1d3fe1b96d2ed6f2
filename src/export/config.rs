use std::collections::BTreeMap;

use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;
use serde::{Deserialize, Serialize};

/// Compression options for the Parquet tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// ZSTD compression at the given level (1-22)
    Zstd(i32),
    /// Snappy compression (faster, slightly larger files)
    Snappy,
    /// No compression
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(9)
    }
}

impl CompressionType {
    /// Maximum compression (slower write, smallest files)
    pub fn max_compression() -> Self {
        Self::Zstd(22)
    }

    /// Fast compression (faster write, larger files)
    pub fn fast() -> Self {
        Self::Snappy
    }

    fn to_parquet(self) -> Compression {
        match self {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Settings of the columnar output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Compression codec
    pub compression: CompressionType,

    /// Maximum rows per row group.
    /// Smaller = better random access, larger = better compression
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write column chunk statistics
    pub write_statistics: bool,

    /// Dictionary page size limit in bytes
    pub dictionary_page_size_limit: usize,

    /// BYTE_STREAM_SPLIT encoding for floating-point measurement columns
    pub use_byte_stream_split: bool,

    /// Store measurement values as Float64 instead of Float32
    pub full_precision_measurements: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::default(),
            row_group_size: 100_000,
            data_page_size: 1024 * 1024,
            write_statistics: true,
            dictionary_page_size_limit: 1024 * 1024,
            use_byte_stream_split: true,
            full_precision_measurements: false,
        }
    }
}

impl ExportConfig {
    /// Configuration optimized for fast writing (larger files)
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::fast(),
            row_group_size: 50_000,
            data_page_size: 512 * 1024,
            dictionary_page_size_limit: 512 * 1024,
            ..Self::default()
        }
    }

    /// Writer properties for one table.
    ///
    /// `dictionary_columns` hold repeated labels; `float_columns` hold
    /// high-cardinality measurements and never use a dictionary.
    pub(super) fn to_writer_properties(
        &self,
        dictionary_columns: &[&str],
        float_columns: &[&str],
        metadata: &BTreeMap<String, String>,
    ) -> WriterProperties {
        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(self.compression.to_parquet())
            .set_data_page_size_limit(self.data_page_size)
            .set_dictionary_page_size_limit(self.dictionary_page_size_limit)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size.max(1));

        for col in dictionary_columns {
            builder = builder.set_column_dictionary_enabled(ColumnPath::new(vec![col.to_string()]), true);
        }
        for col in float_columns {
            builder = builder.set_column_dictionary_enabled(ColumnPath::new(vec![col.to_string()]), false);
            if self.use_byte_stream_split {
                builder = builder
                    .set_column_encoding(ColumnPath::new(vec![col.to_string()]), Encoding::BYTE_STREAM_SPLIT);
            }
        }

        let kv_metadata: Vec<KeyValue> = metadata
            .iter()
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: Some(v.clone()),
            })
            .collect();

        builder.set_key_value_metadata(Some(kv_metadata)).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.compression, CompressionType::Zstd(9));
        assert!(config.use_byte_stream_split);
        assert!(!config.full_precision_measurements);
    }

    #[test]
    fn test_writer_properties() {
        let mut metadata = BTreeMap::new();
        metadata.insert("b".to_string(), "2".to_string());
        metadata.insert("a".to_string(), "1".to_string());
        let props = ExportConfig::default().to_writer_properties(&["parameter"], &["value"], &metadata);

        let value = ColumnPath::new(vec!["value".to_string()]);
        assert!(!props.dictionary_enabled(&value));
        assert_eq!(props.encoding(&value), Some(Encoding::BYTE_STREAM_SPLIT));
        assert!(props.dictionary_enabled(&ColumnPath::new(vec!["parameter".to_string()])));

        let keys: Vec<&str> = props
            .key_value_metadata()
            .unwrap()
            .iter()
            .map(|kv| kv.key.as_str())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_compression_from_toml() {
        let config: ExportConfig = toml::from_str("compression = \"snappy\"\nrow_group_size = 10").unwrap();
        assert_eq!(config.compression, CompressionType::Snappy);
        assert_eq!(config.row_group_size, 10);

        let config: ExportConfig = toml::from_str("compression = { zstd = 3 }").unwrap();
        assert_eq!(config.compression, CompressionType::Zstd(3));
    }
}
