use super::*;
use crate::argo::FileCategory;
use crate::config::PipelineConfig;
use crate::export::{ExportInput, Exporter, ProcessingLog};
use crate::netcdf::NcFile;
use crate::preprocess::{Preprocessed, Preprocessor};
use crate::schema::{explore, RawInstrumentFile};
use crate::synthetic::SyntheticFile;
use crate::validator::Validator;
use tempfile::tempdir;

fn write_demo(
    category: FileCategory,
    config: &PipelineConfig,
    output_dir: &Path,
) -> Result<(PathBuf, Preprocessed), Box<dyn std::error::Error>> {
    let nc = NcFile::from_bytes(SyntheticFile::demo(category, 3, 20).to_bytes()?)?;
    let name = match category {
        FileCategory::Core => "D1900722_001.nc",
        _ => "BD1900722_001.nc",
    };
    let file = RawInstrumentFile::from_netcdf(name, nc);
    let schema = explore(&file);
    let validation = Validator::new(config.validation.clone()).validate(&file, &schema);
    let preprocessed = Preprocessor::new(config).preprocess(&file, &schema, &validation)?;
    let artifacts = Exporter::new(config).export(
        ExportInput {
            file: &file,
            schema: &schema,
            validation: &validation,
            preprocessed: &preprocessed,
        },
        output_dir,
        ProcessingLog::start(config),
    )?;
    Ok((artifacts.directory, preprocessed))
}

#[test]
fn test_read_write_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut config = PipelineConfig::default();
    config.export.full_precision_measurements = true;
    let (result_dir, expected) = write_demo(FileCategory::Biogeochemical, &config, dir.path())?;

    let reader = ResultReader::open(&result_dir)?;
    let tables = reader.read_tables()?;

    assert_eq!(tables.observations.len(), expected.observations.len());
    for (read, written) in tables.observations.iter().zip(expected.observations.iter()) {
        assert_eq!(read.profile_id, written.profile_id);
        assert_eq!(read.parameter, written.parameter);
        assert_eq!(read.value, written.value);
        assert_eq!(read.qc_flag, written.qc_flag);
        assert_eq!(read.adjusted_error, written.adjusted_error);
        assert_eq!(read.data_mode, written.data_mode);
        // depth is always stored as Float32
        assert!((read.depth - written.depth).abs() < 1e-3);
    }

    assert_eq!(tables.profiles.len(), 3);
    for (read, written) in tables.profiles.iter().zip(expected.profiles.iter()) {
        assert_eq!(read.profile_id, written.profile_id);
        assert_eq!(read.timestamp, written.timestamp);
        assert_eq!(read.parameters, written.parameters);
        assert_eq!(read.has_biogeochemical, written.has_biogeochemical);
        assert_eq!(read.data_mode, written.data_mode);
        assert_eq!(read.statistics, written.statistics);
    }
    Ok(())
}

#[test]
fn test_footer_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let (result_dir, expected) = write_demo(FileCategory::Core, &PipelineConfig::default(), dir.path())?;

    let reader = ResultReader::open(&result_dir)?;
    let observations = reader.observations_metadata()?;
    assert_eq!(observations.format_version, columns::FORMAT_VERSION);
    assert_eq!(observations.table, columns::OBSERVATIONS_TABLE);
    assert_eq!(observations.source_file, "D1900722_001.nc");
    assert_eq!(observations.total_rows as usize, expected.observations.len());

    let profiles = reader.profiles_metadata()?;
    assert_eq!(profiles.table, columns::PROFILES_TABLE);
    assert_eq!(profiles.total_rows, 3);

    let quality = reader.quality_report()?;
    assert_eq!(quality["profiles_exported"], 3);
    Ok(())
}

#[test]
fn test_open_requires_all_artifacts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join(OBSERVATIONS_FILE), b"")?;
    let err = ResultReader::open(dir.path()).unwrap_err();
    assert!(matches!(err, ReaderError::InvalidFormat(_)));
    Ok(())
}
