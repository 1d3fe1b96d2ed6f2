use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use argo_dataops::argo::DepthMethod;

mod config;
mod demo;
mod inspect;
mod process;
mod validate;

/// argo-dataops - ARGO float NetCDF ingestion and validation pipeline
#[derive(Parser)]
#[command(name = "argo-dataops")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Depth derivation strategy.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DepthMethodArg {
    /// UNESCO 1983 with latitude-dependent gravity
    Unesco1983,
    /// 1 dbar = 1 m
    Linear,
}

impl From<DepthMethodArg> for DepthMethod {
    fn from(arg: DepthMethodArg) -> Self {
        match arg {
            DepthMethodArg::Unesco1983 => DepthMethod::Unesco1983,
            DepthMethodArg::Linear => DepthMethod::Linear,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Process NetCDF files (or directories of them) into Parquet tables
    Process {
        /// Input files or directories
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short = 'o', long, value_name = "DIR")]
        output: PathBuf,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Files processed concurrently
        #[arg(short = 'w', long)]
        workers: Option<usize>,

        /// Keep everything except bad (4) and missing (9) values
        #[arg(long)]
        relaxed_qc: bool,

        /// Depth derivation method
        #[arg(long, value_enum)]
        depth_method: Option<DepthMethodArg>,
    },

    /// Print the schema report of a NetCDF file as JSON
    Inspect {
        /// Input NetCDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Validate a NetCDF file against the ARGO checks
    Validate {
        /// Input NetCDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Load validation bounds from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Write synthetic core and biogeochemical profile files
    Demo {
        /// Output directory
        #[arg(value_name = "OUTPUT_DIR", default_value = "demo_argo")]
        output: PathBuf,

        /// Profiles per file
        #[arg(long, default_value = "5")]
        profiles: usize,

        /// Levels per profile
        #[arg(long, default_value = "60")]
        levels: usize,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Process {
            inputs,
            output,
            config,
            workers,
            relaxed_qc,
            depth_method,
        } => process::run(
            inputs,
            output,
            config,
            workers,
            relaxed_qc,
            depth_method.map(DepthMethod::from),
        ),
        Commands::Inspect { file } => inspect::run(file),
        Commands::Validate { file, config } => validate::run(file, config),
        Commands::Demo {
            output,
            profiles,
            levels,
        } => demo::run(output, profiles, levels),
    }
}
