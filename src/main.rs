//! # argo-dataops
//!
//! Command-line front end of the ARGO DataOps pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Process a directory of profile files
//! argo-dataops process incoming/ -o out/ --workers 8
//!
//! # Look at one file
//! argo-dataops inspect D1900722_001.nc
//! argo-dataops validate D1900722_001.nc
//!
//! # Generate synthetic input
//! argo-dataops demo demo_argo/
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity
    cli::init_logging(cli.verbosity());

    cli::dispatch(cli)
}
