use super::*;
use crate::netcdf::NcWriter;
use crate::synthetic::{SyntheticFile, SyntheticProfile, SyntheticSeries};
use tempfile::tempdir;

fn explore_bytes(name: &str, bytes: Vec<u8>) -> SchemaReport {
    let dir = tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    explore_path(&path).report
}

#[test]
fn test_core_file() {
    let bytes = SyntheticFile::demo(FileCategory::Core, 3, 5).to_bytes().unwrap();
    let report = explore_bytes("1900722_prof.nc", bytes);

    assert!(report.is_readable());
    assert_eq!(report.category, FileCategory::Core);
    assert_eq!(report.category_source, CategorySource::DataType);
    assert_eq!((report.n_prof, report.n_levels), (3, 5));
    assert_eq!(
        report.parameters_present(),
        vec![Parameter::Pres, Parameter::Temp, Parameter::Psal]
    );
    assert!(!report.has_biogeochemical());
    assert_eq!(report.platform_number(0), Some("1900722"));

    assert_eq!(report.data_mode.scope, ModeScope::FileLevel);
    assert_eq!(
        report.data_mode.profile_modes,
        vec![Some(DataMode::Delayed), Some(DataMode::Adjusted), Some(DataMode::RealTime)]
    );
    assert_eq!(report.data_mode.file_level_mode(), None);

    let temp = report.lookup(Parameter::Temp).unwrap();
    assert_eq!(temp.raw.as_ref().unwrap().qc.as_deref(), Some("TEMP_QC"));
    let adjusted = temp.adjusted.as_ref().unwrap();
    assert_eq!(adjusted.value, "TEMP_ADJUSTED");
    assert_eq!(adjusted.error.as_deref(), Some("TEMP_ADJUSTED_ERROR"));
}

#[test]
fn test_variable_groups() {
    let bytes = SyntheticFile::demo(FileCategory::Core, 1, 3).to_bytes().unwrap();
    let report = explore_bytes("core.nc", bytes);

    let group = |name: &str| report.variable(name).map(|v| v.group);
    assert_eq!(group("JULD"), Some(VariableGroup::Coordinate));
    assert_eq!(group("TEMP"), Some(VariableGroup::Measurement));
    assert_eq!(group("TEMP_ADJUSTED"), Some(VariableGroup::MeasurementAdjusted));
    assert_eq!(group("TEMP_ADJUSTED_ERROR"), Some(VariableGroup::MeasurementAdjustedError));
    assert_eq!(group("POSITION_QC"), Some(VariableGroup::QualityFlag));
    assert_eq!(group("CYCLE_NUMBER"), Some(VariableGroup::Administrative));
    assert_eq!(group("PLATFORM_NUMBER"), Some(VariableGroup::CharacterAdministrative));

    let temp = report.variable("TEMP").unwrap();
    assert_eq!(temp.units.as_deref(), Some("degree_Celsius"));
    assert_eq!(temp.dimensions, vec!["N_PROF", "N_LEVELS"]);
    assert_eq!(temp.attributes.get("_FillValue").map(String::as_str), Some("99999"));
}

#[test]
fn test_biogeochemical_file() {
    let bytes = SyntheticFile::demo(FileCategory::Biogeochemical, 2, 4).to_bytes().unwrap();
    let report = explore_bytes("BD1900722_001.nc", bytes);

    assert_eq!(report.category, FileCategory::Biogeochemical);
    assert!(report.has_biogeochemical());
    assert_eq!(report.data_mode.scope, ModeScope::PerParameter);
    assert_eq!(report.data_mode.parameter_mode(0, Parameter::Doxy), Some(DataMode::Adjusted));
    assert_eq!(report.data_mode.parameter_mode(0, Parameter::Chla), Some(DataMode::RealTime));
    assert_eq!(report.data_mode.parameter_mode(1, Parameter::Temp), Some(DataMode::Adjusted));
    assert!(report.lookup(Parameter::Chla).unwrap().adjusted.is_none());
    assert_eq!(
        report.text_fields.get("STATION_PARAMETERS").unwrap()[..5],
        ["PRES", "TEMP", "PSAL", "DOXY", "CHLA"]
    );
}

#[test]
fn test_unreadable_files() {
    let report = explore_bytes("R1900722_001.nc", b"not a netcdf file".to_vec());
    assert!(report.unreadable.is_some());
    assert!(report.variables.is_empty());
    assert_eq!(report.filename_hint.unwrap().cycle_number, Some(1));

    let mut bytes = SyntheticFile::demo(FileCategory::Core, 2, 10).to_bytes().unwrap();
    bytes.truncate(bytes.len() - 16);
    let report = explore_bytes("truncated.nc", bytes);
    assert!(report.unreadable.is_some());
    assert!(report.variables.is_empty());

    let dir = tempdir().unwrap();
    let exploration = explore_path(dir.path().join("missing.nc"));
    assert!(exploration.file.is_none());
    assert!(exploration.report.unreadable.is_some());
}

#[test]
fn test_filename_disagreement_is_a_warning() {
    let bytes = SyntheticFile::demo(FileCategory::Core, 1, 3).to_bytes().unwrap();
    let report = explore_bytes("BR1900722_001.nc", bytes);
    assert_eq!(report.category, FileCategory::Core);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("file name suggests a biogeochemical file")));
    // Profile 0 of the demo is delayed mode while the name says R
    assert!(report.warnings.iter().any(|w| w.contains("DATA_MODE disagrees")));
}

#[test]
fn test_unknown_measurements_and_noisy_text() {
    let mut writer = NcWriter::new();
    writer.add_dimension("N_PROF", 1).unwrap();
    writer.add_dimension("N_LEVELS", 2).unwrap();
    writer.add_dimension("STRING8", 8).unwrap();
    writer
        .add_variable("TURBIDITY", &["N_PROF", "N_LEVELS"], NcValues::Floats(vec![1.0, 2.0]))
        .unwrap();
    writer
        .add_variable("PLATFORM_NUMBER", &["N_PROF", "STRING8"], NcValues::Chars(b"59\x01048  ".to_vec()))
        .unwrap();
    let report = explore_bytes("odd.nc", writer.to_bytes().unwrap());

    assert_eq!(report.unknown_measurements, vec!["TURBIDITY"]);
    assert_eq!(report.platform_number(0), Some("59048"));
    assert!(report.warnings.iter().any(|w| w.starts_with("PLATFORM_NUMBER[0]")));
    assert_eq!(report.data_mode.scope, ModeScope::Undeclared);
    assert_eq!(report.category_source, CategorySource::Default);
}

#[test]
fn test_report_serializes() {
    let profile = SyntheticProfile::new(1, 25000.0, 0.0, 0.0, DataMode::RealTime)
        .with(Parameter::Pres, SyntheticSeries::raw(&[1.0], "1"));
    let bytes = SyntheticFile::new(FileCategory::Core, "42")
        .with_profile(profile)
        .to_bytes()
        .unwrap();
    let report = explore_bytes("R42_001.nc", bytes);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["category"], "core");
    assert_eq!(json["data_mode"]["profile_modes"][0], "real-time");
    assert!(json["parameters"]["PRES"]["raw"].is_object());
}
