/// Errors that can occur while reading or writing NetCDF classic files
#[derive(Debug, thiserror::Error)]
pub enum NcError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The leading magic bytes do not identify a NetCDF file
    #[error("Not a NetCDF file (magic bytes {0:02x?})")]
    NotNetcdf([u8; 4]),

    /// A NetCDF flavour this reader does not decode (CDF-5, NetCDF-4/HDF5)
    #[error("Unsupported NetCDF variant: {0}")]
    Unsupported(String),

    /// The header could not be decoded
    #[error("Invalid NetCDF-3 header: {0}")]
    Read(String),

    /// The file ended before a declared structure was complete
    #[error("Truncated file while reading {0}")]
    Truncated(String),

    /// The header contradicts itself in a way the decoder cannot recover from
    #[error("Malformed header: {0}")]
    Malformed(String),

    /// Lookup of a variable that is not declared in the header
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// A variable was read with an accessor for an incompatible type
    #[error("Type mismatch for {variable}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Variable name
        variable: String,
        /// Requested type family
        expected: &'static str,
        /// Declared NetCDF type
        found: &'static str,
    },

    /// Writer was given an inconsistent definition
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// The encoder rejected the payload
    #[error("Write failed: {0}")]
    Write(String),
}

// The decoder's error types hold `Rc` handles and are not `Send`, so they are
// flattened to text before crossing into worker results.
impl From<netcdf3::ReadError> for NcError {
    fn from(err: netcdf3::ReadError) -> Self {
        match err {
            netcdf3::ReadError::IOErrorKind(kind) => NcError::IoError(kind.into()),
            other => NcError::Read(other.to_string()),
        }
    }
}

impl From<netcdf3::InvalidDataSet> for NcError {
    fn from(err: netcdf3::InvalidDataSet) -> Self {
        NcError::InvalidDefinition(err.to_string())
    }
}

impl From<netcdf3::WriteError> for NcError {
    fn from(err: netcdf3::WriteError) -> Self {
        match err {
            netcdf3::WriteError::IOErrorKind(kind) => NcError::IoError(kind.into()),
            other => NcError::Write(format!("{other:?}")),
        }
    }
}
