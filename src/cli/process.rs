use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use argo_dataops::argo::DepthMethod;
use argo_dataops::config::{PipelineConfig, QcPolicy};
use argo_dataops::pipeline::{discover_inputs, BatchRunner};

use super::config::Config;

/// Batch report file written next to the per-file result directories
const BATCH_REPORT_FILE: &str = "batch_report.json";

/// Process NetCDF files into Parquet tables
pub fn run(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    config_path: Option<PathBuf>,
    workers: Option<usize>,
    relaxed_qc: bool,
    depth_method: Option<DepthMethod>,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => Config::from_file(path)?.into_pipeline_config(),
        None => PipelineConfig::default(),
    };
    if let Some(workers) = workers {
        config.workers = workers;
    }
    if relaxed_qc {
        config.qc = QcPolicy::relaxed();
    }
    if let Some(method) = depth_method {
        config.depth_method = method;
    }

    let mut files = Vec::new();
    for input in &inputs {
        let found = discover_inputs(input)
            .with_context(|| format!("Failed to list input: {}", input.display()))?;
        files.extend(found);
    }
    if files.is_empty() {
        anyhow::bail!("No NetCDF files found in the given inputs");
    }

    info!("ARGO DataOps - NetCDF to Parquet");
    info!("================================");
    info!("Inputs: {} files", files.len());
    info!("Output: {}", output.display());
    info!("QC policy: {}", config.qc.label());
    info!("Depth method: {}", config.depth_method.name());
    info!("Workers: {}", config.workers);

    let report = BatchRunner::new(config)
        .run(&files, &output)
        .context("Batch run failed")?;

    let report_path = output.join(BATCH_REPORT_FILE);
    let json = serde_json::to_vec_pretty(&report).context("Failed to serialize batch report")?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    println!("{}", report);
    println!("Batch report: {}", report_path.display());

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
