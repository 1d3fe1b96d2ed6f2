use super::*;
use crate::argo::{DataMode, FileCategory, Parameter};
use crate::netcdf::NcFile;
use crate::schema::explore;
use crate::synthetic::{SyntheticFile, SyntheticProfile, SyntheticSeries};

fn open(file: &SyntheticFile) -> (RawInstrumentFile, SchemaReport) {
    let nc = NcFile::from_bytes(file.to_bytes().unwrap()).unwrap();
    let raw = RawInstrumentFile::from_netcdf("R1900722_001.nc", nc);
    let schema = explore(&raw);
    (raw, schema)
}

fn single_profile(latitude: f64, longitude: f64, temp: f64, temp_qc: &str) -> SyntheticFile {
    let profile = SyntheticProfile::new(1, 25000.5, latitude, longitude, DataMode::RealTime)
        .with(Parameter::Pres, SyntheticSeries::raw(&[5.0, 10.0], "11"))
        .with(Parameter::Temp, SyntheticSeries::raw(&[temp, 14.0], temp_qc))
        .with(Parameter::Psal, SyntheticSeries::raw(&[35.0, 35.1], "11"));
    SyntheticFile::new(FileCategory::Core, "1900722").with_profile(profile)
}

fn validate(file: &SyntheticFile, bounds: ValidationBounds) -> ValidationReport {
    let (raw, schema) = open(file);
    Validator::new(bounds).validate(&raw, &schema)
}

#[test]
fn test_clean_file_passes() {
    let report = validate(&SyntheticFile::demo(FileCategory::Core, 3, 20), ValidationBounds::default());
    assert!(!report.has_failures(), "{report}");
    assert!(report.is_processable());
    assert!(report.check("mandatory_field:PRES").unwrap().passed());
    assert!(report.check("physical_range:TEMP_ADJUSTED").is_some());

    let temp = report.qc_histogram.get("TEMP").unwrap();
    // 17-level pattern: one '3' and one '4' in the first 17 levels of each profile
    assert_eq!(temp.get("4"), Some(&3));
    assert_eq!(temp.get("3"), Some(&3));
    assert_eq!(temp.get("1"), Some(&54));
}

#[test]
fn test_latitude_out_of_bounds_is_fatal() {
    let report = validate(&single_profile(95.0, 10.0, 15.0, "11"), ValidationBounds::default());
    let check = report.check("latitude_bounds").unwrap();
    assert!(!check.passed());
    assert!(check.is_fatal_failure());
    assert!(report.has_fatal_failure_in(CheckCategory::Geographic));
    assert!(!report.is_processable());
    assert!(report.check("longitude_bounds").unwrap().passed());
}

#[test]
fn test_longitude_out_of_bounds() {
    let report = validate(&single_profile(12.5, 200.0, 15.0, "11"), ValidationBounds::default());
    let check = report.check("longitude_bounds").unwrap();
    assert!(!check.passed());
    assert!(matches!(&check.status, CheckStatus::Failed(msg) if msg.contains("200")));
    assert!(!report.is_processable());
}

#[test]
fn test_soft_position_policy() {
    let bounds = ValidationBounds {
        reject_invalid_position: false,
        ..ValidationBounds::default()
    };
    let report = validate(&single_profile(12.5, 200.0, 15.0, "11"), bounds);
    assert!(report.has_failures());
    assert!(report.is_processable());
}

#[test]
fn test_missing_mandatory_field_collects_all() {
    let file = single_profile(12.5, 20.0, 15.0, "61").without_variable("LATITUDE");
    let report = validate(&file, ValidationBounds::default());

    let check = report.check("mandatory_field:LATITUDE").unwrap();
    assert!(check.is_fatal_failure());
    assert!(report.has_fatal_failure_in(CheckCategory::Mandatory));
    assert!(report.check("latitude_bounds").is_none());
    // Later checks still ran
    assert!(!report.check("qc_vocabulary:TEMP_QC").unwrap().passed());
    assert!(report.check("longitude_bounds").unwrap().passed());
}

#[test]
fn test_reserved_flags_fail_softly() {
    let report = validate(&single_profile(12.5, 20.0, 15.0, "71"), ValidationBounds::default());
    let check = report.check("qc_vocabulary:TEMP_QC").unwrap();
    assert!(!check.passed());
    assert!(!check.fatal);
    assert!(report.is_processable());
    assert_eq!(report.qc_histogram["TEMP"].get("7"), Some(&1));
}

#[test]
fn test_physical_range_fails_softly() {
    let report = validate(&single_profile(12.5, 20.0, 60.0, "11"), ValidationBounds::default());
    let check = report.check("physical_range:TEMP").unwrap();
    assert!(!check.passed());
    assert!(report.is_processable());

    let bounds = ValidationBounds {
        temperature: crate::config::ValueRange::new(-5.0, 70.0),
        ..ValidationBounds::default()
    };
    let report = validate(&single_profile(12.5, 20.0, 60.0, "11"), bounds);
    assert!(report.check("physical_range:TEMP").unwrap().passed());
}

#[test]
fn test_unreadable_schema() {
    let (raw, _) = open(&SyntheticFile::demo(FileCategory::Core, 1, 2));
    let mut schema = SchemaReport::empty("broken.nc");
    schema.unreadable = Some("Truncated file while reading TEMP".to_string());

    let report = Validator::default().validate(&raw, &schema);
    assert_eq!(report.checks.len(), 1);
    assert!(report.check("file_readable").unwrap().is_fatal_failure());
}

#[test]
fn test_exploration_of_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let exploration = crate::schema::explore_path(dir.path().join("D1900722_001.nc"));

    let report = Validator::default().validate_exploration(&exploration);
    assert!(!report.is_processable());
    assert_eq!(report.file_path, "D1900722_001.nc");
}
