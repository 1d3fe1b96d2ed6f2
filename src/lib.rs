//! # argo-dataops - ARGO Profile Ingestion and Validation
//!
//! `argo_dataops` turns raw ARGO float NetCDF files into analysis-ready,
//! quality-controlled Parquet tables with an auditable trail of every
//! decision taken along the way.
//!
//! ## Key Features
//!
//! - **NetCDF Classic Input**: CDF-1 and CDF-2 files are decoded with the
//!   pure-Rust `netcdf3` crate. Malformed or truncated files become
//!   structured errors, never panics.
//!
//! - **Schema Discovery**: Variables are classified by role (identity, time,
//!   position, measurement, QC, metadata) and the file category and data mode
//!   are inferred from content, with the file name as a fallback hint.
//!
//! - **Validation Report**: Mandatory fields, geographic bounds, physical
//!   ranges and QC flag vocabulary are checked. Only position problems are
//!   fatal; everything else is reported and handled downstream.
//!
//! - **Mode-Aware Preprocessing**: Real-time profiles use raw values, adjusted
//!   and delayed-mode profiles use the `_ADJUSTED` variants. QC filtering,
//!   pressure-to-depth conversion and per-profile summary statistics follow.
//!
//! - **Atomic Export**: Observations and profile summaries are written as
//!   ZSTD-compressed Parquet with a JSON quality report and processing log.
//!   A result directory is either complete or absent.
//!
//! - **Bounded Batch Processing**: Files run in parallel on a fixed worker
//!   pool; one bad file never stops its siblings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use argo_dataops::config::PipelineConfig;
//! use argo_dataops::pipeline::{discover_inputs, BatchRunner};
//!
//! let files = discover_inputs("incoming/")?;
//! let report = BatchRunner::new(PipelineConfig::default()).run(&files, "out".as_ref())?;
//! for record in report.files.values() {
//!     println!("{}: {}", record.file_name, record.status);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A processed file `D1900722_001.nc` produces:
//!
//! ```text
//! out/D1900722_001/
//! ├── observations.parquet   # one row per retained measurement
//! ├── profiles.parquet       # one row per profile with summary statistics
//! ├── quality_report.json    # validation and QC filtering outcome
//! └── processing_log.json    # provenance, settings, timings, warnings
//! ```
//!
//! ## Stage by Stage
//!
//! ```rust,no_run
//! use argo_dataops::config::PipelineConfig;
//! use argo_dataops::export::{Exporter, ExportInput, ProcessingLog};
//! use argo_dataops::preprocess::Preprocessor;
//! use argo_dataops::schema::{explore, RawInstrumentFile};
//! use argo_dataops::validator::Validator;
//!
//! let config = PipelineConfig::default();
//! let file = RawInstrumentFile::open("D1900722_001.nc")?;
//! let schema = explore(&file);
//! let validation = Validator::new(config.validation.clone()).validate(&file, &schema);
//! let preprocessed = Preprocessor::new(&config).preprocess(&file, &schema, &validation)?;
//!
//! let input = ExportInput { file: &file, schema: &schema, validation: &validation, preprocessed: &preprocessed };
//! let artifacts = Exporter::new(&config).export(input, "out".as_ref(), ProcessingLog::start(&config))?;
//! println!("{} observations", artifacts.observation_rows);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reading Results
//!
//! The tables are plain Parquet and open in any Parquet-aware tool:
//!
//! ```python
//! # Python
//! import pyarrow.parquet as pq
//! df = pq.read_table("out/D1900722_001/observations.parquet").to_pandas()
//! ```
//!
//! ```sql
//! -- DuckDB
//! SELECT profile_id, avg(temperature) FROM read_parquet('out/*/observations.parquet')
//! GROUP BY profile_id;
//! ```
//!
//! From Rust, [`reader::ResultReader`] loads a result directory back into
//! the in-memory tables.
//!
//! ## Architecture
//!
//! - [`netcdf`]: NetCDF classic container reader and writer
//! - [`argo`]: parameters, data modes, QC flags, JULD and depth conversion
//! - [`schema`]: Schema Explorer
//! - [`validator`]: Validator
//! - [`preprocess`]: Preprocessor
//! - [`export`]: Parquet and JSON exporter
//! - [`reader`]: reading exported results back
//! - [`pipeline`]: batch orchestrator and per-file state machine
//! - [`config`]: immutable pipeline configuration
//! - [`synthetic`]: synthetic ARGO files for demos and tests

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod argo;
pub mod config;
pub mod export;
pub mod netcdf;
pub mod pipeline;
pub mod preprocess;
pub mod reader;
pub mod schema;
pub mod synthetic;
pub mod validator;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::argo::{DataMode, DepthMethod, FileCategory, Parameter, QcFlag};
    pub use crate::config::{PipelineConfig, QcPolicy, ValidationBounds, ValueRange};
    pub use crate::export::{
        CompressionType, ExportArtifacts, ExportConfig, ExportError, ExportInput, Exporter,
        ProcessingLog, QualityReport,
    };
    pub use crate::netcdf::{NcError, NcFile};
    pub use crate::pipeline::{
        discover_inputs, BatchReport, BatchRunner, CancellationToken, FailureReason, FileRecord,
        FileState, FileStatus, PipelineError,
    };
    pub use crate::preprocess::{
        ObservationTable, Preprocessed, PreprocessError, Preprocessor, ProfileTable,
    };
    pub use crate::reader::{ReaderError, ResultReader};
    pub use crate::schema::{explore, explore_path, RawInstrumentFile, SchemaReport};
    pub use crate::validator::{ValidationReport, Validator};
}
