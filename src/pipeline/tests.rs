use super::*;
use crate::argo::{DataMode, Parameter};
use crate::synthetic::{SyntheticFile, SyntheticProfile, SyntheticSeries};
use tempfile::tempdir;

fn write_core(dir: &Path, name: &str, latitude: f64, longitude: f64) -> PathBuf {
    let profile = SyntheticProfile::new(1, 25000.5, latitude, longitude, DataMode::Delayed)
        .with(
            Parameter::Pres,
            SyntheticSeries::raw(&[10.0, 20.0], "11").with_adjusted(&[10.0, 20.0], "11"),
        )
        .with(
            Parameter::Temp,
            SyntheticSeries::raw(&[15.0, 14.0], "11").with_adjusted(&[14.8, 13.9], "11"),
        );
    let path = dir.join(name);
    SyntheticFile::new(FileCategory::Core, "1900722")
        .with_profile(profile)
        .write_to_path(&path)
        .unwrap();
    path
}

fn runner(workers: usize) -> BatchRunner {
    BatchRunner::new(PipelineConfig {
        workers,
        ..PipelineConfig::default()
    })
}

#[test]
fn test_failure_isolation() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let first = write_core(input.path(), "D1900722_001.nc", 12.5, -30.0);
    let corrupt = input.path().join("D1900722_002.nc");
    fs::write(&corrupt, b"CDF\x01 this is not a profile").unwrap();
    let third = write_core(input.path(), "D1900722_003.nc", 13.0, -29.5);

    let report = runner(2)
        .run(&[first.clone(), corrupt.clone(), third.clone()], output.path())
        .unwrap();

    assert_eq!((report.total, report.done, report.rejected, report.failed), (3, 2, 0, 1));
    assert!(report.get("D1900722_001.nc").unwrap().status.is_done());
    assert!(report.get("D1900722_003.nc").unwrap().status.is_done());
    let failed = report.get("D1900722_002.nc").unwrap();
    assert_eq!(failed.status.reason(), Some(FailureReason::Unreadable));
    assert_eq!(failed.history.states(), &[FileState::Discovered, FileState::Failed]);

    assert!(output.path().join("D1900722_001").join("observations.parquet").is_file());
    assert!(output.path().join("D1900722_003").join("profiles.parquet").is_file());
    assert!(!output.path().join("D1900722_002").exists());
}

#[test]
fn test_done_history() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let path = write_core(input.path(), "D1900722_001.nc", 12.5, -30.0);

    let record = runner(1).process_file(&path, output.path());
    assert!(record.status.is_done(), "{}", record.status);
    assert_eq!(
        record.history.states(),
        &[
            FileState::Discovered,
            FileState::SchemaExplored,
            FileState::Validated,
            FileState::Preprocessed,
            FileState::Exported,
            FileState::Done,
        ]
    );
    assert_eq!(record.observations, 2);
    assert_eq!(record.profiles, 1);
    assert_eq!(record.output_directory, Some(output.path().join("D1900722_001")));
}

#[test]
fn test_invalid_longitude_is_rejected() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let path = write_core(input.path(), "D1900722_001.nc", 12.5, 200.0);

    let report = runner(1).run(&[path], output.path()).unwrap();
    let record = report.get("D1900722_001.nc").unwrap();
    assert!(record.status.is_rejected());
    assert_eq!(record.status.reason(), Some(FailureReason::InvalidPosition));
    assert_eq!(record.state(), FileState::Rejected);
    assert!(record.validation_failures.iter().any(|f| f.starts_with("longitude")));
    assert!(!output.path().join("D1900722_001").exists());
}

#[test]
fn test_missing_latitude_is_rejected() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let path = input.path().join("R1900722_001.nc");
    SyntheticFile::demo(FileCategory::Core, 1, 5)
        .without_variable("LATITUDE")
        .write_to_path(&path)
        .unwrap();

    let record = runner(1).process_file(&path, output.path());
    assert_eq!(record.status.reason(), Some(FailureReason::MissingMandatoryFields));
    assert!(record.status.is_rejected());
}

#[test]
fn test_cancelled_batch_writes_nothing() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let files: Vec<PathBuf> = (1..=3)
        .map(|i| write_core(input.path(), &format!("D1900722_00{}.nc", i), 12.5, -30.0))
        .collect();

    let token = CancellationToken::new();
    token.cancel();
    let report = runner(2).run_with_cancel(&files, output.path(), &token).unwrap();

    assert!(report.cancelled);
    assert_eq!(report.failed, 3);
    assert_eq!(report.count_reason(FailureReason::Cancelled), 3);
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn test_same_file_name_in_two_folders() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let mut paths = Vec::new();
    for (folder, n_profiles) in [("a", 2), ("b", 5)] {
        let dir = input.path().join(folder);
        fs::create_dir(&dir).unwrap();
        let path = dir.join("D1900722_001.nc");
        SyntheticFile::demo(FileCategory::Core, n_profiles, 5)
            .write_to_path(&path)
            .unwrap();
        paths.push(path);
    }

    let report = runner(2).run(&[paths[1].clone(), paths[0].clone()], output.path()).unwrap();

    assert_eq!((report.total, report.done, report.failed), (2, 1, 1));
    let kept = &report.files[&paths[0].display().to_string()];
    assert!(kept.status.is_done());
    assert_eq!(kept.profiles, 2);
    let skipped = &report.files[&paths[1].display().to_string()];
    assert_eq!(skipped.status.reason(), Some(FailureReason::DuplicateOutput));
    assert_eq!(skipped.history.states(), &[FileState::Discovered, FileState::Failed]);
    assert_eq!(report.count_reason(FailureReason::DuplicateOutput), 1);

    let entries: Vec<_> = fs::read_dir(output.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert!(output.path().join("D1900722_001").join("observations.parquet").is_file());
}

#[test]
fn test_blocked_result_directory_is_a_write_failure() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let path = write_core(input.path(), "D1900722_001.nc", 12.5, -30.0);
    let blocker = output.path().join("D1900722_001");
    fs::write(&blocker, b"not a directory").unwrap();

    let record = runner(1).process_file(&path, output.path());

    assert_eq!(record.status.reason(), Some(FailureReason::WriteFailed));
    assert_eq!(record.state(), FileState::Failed);
    assert!(record.output_directory.is_none());
    assert!(blocker.is_file());
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 1);
}

#[test]
fn test_discover_inputs() {
    let dir = tempdir().unwrap();
    for name in ["b.nc", "a.nc", "notes.txt", "C.NC"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    fs::create_dir(dir.path().join("nested.nc")).unwrap();

    let files = discover_inputs(dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["C.NC", "a.nc", "b.nc"]);

    let single = discover_inputs(dir.path().join("a.nc")).unwrap();
    assert_eq!(single.len(), 1);
    assert!(discover_inputs(dir.path().join("missing.nc")).is_err());
}

#[test]
fn test_zero_workers_is_a_config_error() {
    let output = tempdir().unwrap();
    let err = runner(0).run(&[], output.path()).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_batch_report_json() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let path = write_core(input.path(), "D1900722_001.nc", 12.5, 200.0);
    let report = runner(1).run(&[path.clone()], output.path()).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    let key = path.display().to_string();
    assert_eq!(json["rejected"], 1);
    assert_eq!(json["files"][key.as_str()]["status"], "rejected");
    assert_eq!(json["files"][key.as_str()]["reason"], "invalid_position");
    assert_eq!(json["files"][key.as_str()]["history"][2], "validated");
}
