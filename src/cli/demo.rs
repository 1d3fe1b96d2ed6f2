use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use argo_dataops::argo::FileCategory;
use argo_dataops::synthetic::SyntheticFile;

/// Write a core and a biogeochemical multi-profile file for float 1900722
pub fn run(output: PathBuf, profiles: usize, levels: usize) -> Result<()> {
    info!("argo-dataops - synthetic profile generator");
    info!("==========================================");

    if profiles == 0 || levels == 0 {
        anyhow::bail!("--profiles and --levels must both be at least 1");
    }

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    for (category, name) in [
        (FileCategory::Core, "1900722_prof.nc"),
        (FileCategory::Biogeochemical, "1900722_Bprof.nc"),
    ] {
        let path = output.join(name);
        let bytes = SyntheticFile::demo(category, profiles, levels)
            .write_to_path(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "  {} ({} profiles x {} levels, {} bytes)",
            path.display(),
            profiles,
            levels,
            bytes
        );
        println!("{}", path.display());
    }

    info!("\nProcess them with:");
    info!("  argo-dataops process {} -o {}_out", output.display(), output.display());

    Ok(())
}
