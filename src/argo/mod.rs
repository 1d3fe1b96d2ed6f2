//! # ARGO Vocabulary
//!
//! Type-safe access to the pieces of the ARGO data format the pipeline makes
//! decisions on: parameter names, data modes, QC flags, the JULD time base and
//! the pressure-to-depth conversion.
//!
//! ## Reference
//! - Argo user's manual: https://doi.org/10.13155/29825

mod depth;
mod mode;
mod parameter;
mod qc;
pub mod time;

pub use depth::DepthMethod;
pub use mode::{DataMode, FileCategory};
pub use parameter::Parameter;
pub use qc::{QcCell, QcFlag};

/// Variable names the pipeline relies on
pub mod variables {
    /// Julian day of the profile (days since 1950-01-01)
    pub const JULD: &str = "JULD";
    /// Julian day of the location fix
    pub const JULD_LOCATION: &str = "JULD_LOCATION";
    /// QC flag of JULD
    pub const JULD_QC: &str = "JULD_QC";
    /// Latitude of the station
    pub const LATITUDE: &str = "LATITUDE";
    /// Longitude of the station
    pub const LONGITUDE: &str = "LONGITUDE";
    /// QC flag of the position
    pub const POSITION_QC: &str = "POSITION_QC";
    /// WMO float identifier
    pub const PLATFORM_NUMBER: &str = "PLATFORM_NUMBER";
    /// Float cycle number
    pub const CYCLE_NUMBER: &str = "CYCLE_NUMBER";
    /// Profile direction ('A' ascending, 'D' descending)
    pub const DIRECTION: &str = "DIRECTION";
    /// Profile-level data mode
    pub const DATA_MODE: &str = "DATA_MODE";
    /// Per-parameter data mode (B and S files)
    pub const PARAMETER_DATA_MODE: &str = "PARAMETER_DATA_MODE";
    /// Parameter names measured at each station
    pub const STATION_PARAMETERS: &str = "STATION_PARAMETERS";
    /// File content description ("Argo profile", "B-Argo profile", ...)
    pub const DATA_TYPE: &str = "DATA_TYPE";
    /// Format version of the file
    pub const FORMAT_VERSION: &str = "FORMAT_VERSION";
    /// Calibration comments
    pub const SCIENTIFIC_CALIB_COMMENT: &str = "SCIENTIFIC_CALIB_COMMENT";
}

/// Dimension names the pipeline relies on
pub mod dimensions {
    /// Number of profiles
    pub const N_PROF: &str = "N_PROF";
    /// Number of vertical levels
    pub const N_LEVELS: &str = "N_LEVELS";
    /// Number of parameters per station
    pub const N_PARAM: &str = "N_PARAM";
}

/// Fill value used for ARGO floating-point measurements
pub const ARGO_FLOAT_FILL: f64 = 99999.0;
