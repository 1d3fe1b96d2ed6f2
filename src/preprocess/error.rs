use crate::netcdf::NcError;

/// Errors that stop preprocessing of a file
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    /// The validator reported missing mandatory fields
    #[error("File is not processable, missing mandatory fields: {}", .0.join(", "))]
    MissingMandatoryFields(Vec<String>),

    /// The schema explorer could not read the file
    #[error("File is not readable: {0}")]
    Unreadable(String),

    /// Reading a variable failed
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] NcError),
}
