use anyhow::Result;
use log::info;
use std::path::PathBuf;

use argo_dataops::schema::explore_path;
use argo_dataops::validator::Validator;

use super::config::Config;

/// Validate an ARGO NetCDF file
pub fn run(file: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let bounds = match &config_path {
        Some(path) => Config::from_file(path)?.into_pipeline_config().validation,
        None => Default::default(),
    };

    info!("ARGO Validator");
    info!("==============");
    info!("File: {}", file.display());
    info!("");

    let exploration = explore_path(&file);
    let report = Validator::new(bounds).validate_exploration(&exploration);

    // Use colorized output if available
    #[cfg(feature = "colorized_output")]
    {
        println!("{}", report.format_colored());
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!("{}", report);
    }

    // Exit with error code if the file would be rejected
    if report.has_fatal_failures() {
        std::process::exit(1);
    }

    Ok(())
}
