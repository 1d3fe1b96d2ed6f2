/// Errors that can occur while writing artifacts
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the Arrow library during array operations
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from the Parquet library during file writing
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Error serializing a JSON report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output location cannot be used
    #[error("Invalid output location: {0}")]
    InvalidOutput(String),
}
