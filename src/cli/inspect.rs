use anyhow::{Context, Result};
use std::path::PathBuf;

use argo_dataops::schema::explore_path;

/// Print the schema report of a NetCDF file
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let exploration = explore_path(&file);
    let json = serde_json::to_string_pretty(&exploration.report)
        .context("Failed to serialize schema report")?;
    println!("{}", json);

    if let Some(reason) = &exploration.report.unreadable {
        eprintln!("File is unreadable: {}", reason);
        std::process::exit(1);
    }
    Ok(())
}
