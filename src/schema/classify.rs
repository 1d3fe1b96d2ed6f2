use serde::Serialize;

use crate::argo::{dimensions, variables};
use crate::netcdf::NcType;

/// Role of a variable inside an ARGO profile file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableGroup {
    /// Time and position of the station
    Coordinate,
    /// Raw measured parameter, one value per level
    Measurement,
    /// Calibration-corrected counterpart of a measurement
    MeasurementAdjusted,
    /// Uncertainty estimate of an adjusted measurement
    MeasurementAdjustedError,
    /// QC flag variable (`*_QC`)
    QualityFlag,
    /// Numeric metadata (cycle number, configuration, history)
    Administrative,
    /// Fixed-width character metadata (platform number, PI name, ...)
    CharacterAdministrative,
}

const COORDINATES: [&str; 4] = [
    variables::JULD,
    variables::JULD_LOCATION,
    variables::LATITUDE,
    variables::LONGITUDE,
];

const ADJUSTED_SUFFIX: &str = "_ADJUSTED";
const ADJUSTED_ERROR_SUFFIX: &str = "_ADJUSTED_ERROR";
const QC_SUFFIX: &str = "_QC";

/// Assign a variable to exactly one group
pub fn classify(name: &str, nc_type: NcType, dimension_names: &[String]) -> VariableGroup {
    if name.ends_with(QC_SUFFIX) {
        return VariableGroup::QualityFlag;
    }
    if COORDINATES.contains(&name) {
        return VariableGroup::Coordinate;
    }
    if nc_type == NcType::Char {
        return VariableGroup::CharacterAdministrative;
    }

    let per_level = dimension_names.iter().any(|d| d == dimensions::N_LEVELS);
    if !per_level {
        return VariableGroup::Administrative;
    }
    if name.ends_with(ADJUSTED_ERROR_SUFFIX) {
        VariableGroup::MeasurementAdjustedError
    } else if name.ends_with(ADJUSTED_SUFFIX) {
        VariableGroup::MeasurementAdjusted
    } else {
        VariableGroup::Measurement
    }
}

/// Parameter name a measurement-family variable belongs to
pub fn measurement_base(name: &str) -> &str {
    let name = name.strip_suffix(QC_SUFFIX).unwrap_or(name);
    name.strip_suffix(ADJUSTED_ERROR_SUFFIX)
        .or_else(|| name.strip_suffix(ADJUSTED_SUFFIX))
        .unwrap_or(name)
}

/// Name of the QC variable paired with a value variable
pub fn qc_name(value_name: &str) -> String {
    format!("{value_name}{QC_SUFFIX}")
}

/// Name of the adjusted-error variable of a parameter
pub fn adjusted_error_name(parameter_name: &str) -> String {
    format!("{parameter_name}{ADJUSTED_ERROR_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Vec<String> {
        vec!["N_PROF".to_string(), "N_LEVELS".to_string()]
    }

    #[test]
    fn test_measurement_families() {
        assert_eq!(classify("TEMP", NcType::Float, &levels()), VariableGroup::Measurement);
        assert_eq!(
            classify("TEMP_ADJUSTED", NcType::Float, &levels()),
            VariableGroup::MeasurementAdjusted
        );
        assert_eq!(
            classify("TEMP_ADJUSTED_ERROR", NcType::Float, &levels()),
            VariableGroup::MeasurementAdjustedError
        );
        assert_eq!(
            classify("TEMP_ADJUSTED_QC", NcType::Char, &levels()),
            VariableGroup::QualityFlag
        );
    }

    #[test]
    fn test_coordinates_and_metadata() {
        let prof = vec!["N_PROF".to_string()];
        assert_eq!(classify("JULD", NcType::Double, &prof), VariableGroup::Coordinate);
        assert_eq!(classify("LATITUDE", NcType::Double, &prof), VariableGroup::Coordinate);
        assert_eq!(classify("POSITION_QC", NcType::Char, &prof), VariableGroup::QualityFlag);
        assert_eq!(classify("CYCLE_NUMBER", NcType::Int, &prof), VariableGroup::Administrative);
        assert_eq!(
            classify("PLATFORM_NUMBER", NcType::Char, &prof),
            VariableGroup::CharacterAdministrative
        );
    }

    #[test]
    fn test_measurement_base() {
        assert_eq!(measurement_base("DOXY"), "DOXY");
        assert_eq!(measurement_base("DOXY_ADJUSTED"), "DOXY");
        assert_eq!(measurement_base("DOXY_ADJUSTED_ERROR"), "DOXY");
        assert_eq!(measurement_base("DOXY_ADJUSTED_QC"), "DOXY");
        assert_eq!(measurement_base("DOXY_QC"), "DOXY");
        assert_eq!(qc_name("PSAL_ADJUSTED"), "PSAL_ADJUSTED_QC");
    }
}
