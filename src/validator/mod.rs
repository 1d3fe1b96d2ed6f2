//! # Data Validator
//!
//! Second pipeline stage. Runs a fixed battery of independent checks against
//! a raw file and its schema report and never modifies either.
//!
//! ## Validation Checklist
//!
//! 1. **Mandatory fields**: `JULD`, `LATITUDE`, `LONGITUDE` and pressure
//!    (`PRES` or `PRES_ADJUSTED`) must exist. Always fatal.
//! 2. **Geographic bounds**: latitude in [-90, 90], longitude in [-180, 180].
//!    Fatal unless `reject_invalid_position` is turned off.
//! 3. **Physical bounds**: pressure in [0, 6000] dbar, temperature in
//!    [-5, 50] degC, salinity in [0, 50] PSU, for raw and adjusted variants.
//! 4. **QC vocabulary**: every flag in {0,1,2,3,4,5,8,9}; 6 and 7 are reserved
//!    and fail the check.
//!
//! Every check runs regardless of earlier failures. The per-variable QC
//! histogram is always computed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use argo_dataops::config::ValidationBounds;
//! use argo_dataops::schema::explore_path;
//! use argo_dataops::validator::Validator;
//!
//! let exploration = explore_path("D1900722_001.nc");
//! if let Some(file) = &exploration.file {
//!     let report = Validator::new(ValidationBounds::default()).validate(file, &exploration.report);
//!     println!("{}", report);
//! }
//! ```

use log::{debug, info};

pub use report::{CheckCategory, CheckStatus, QcHistogram, ValidationCheck, ValidationReport};

mod flags;
mod mandatory;
mod ranges;
mod report;

use crate::config::ValidationBounds;
use crate::schema::{Exploration, RawInstrumentFile, SchemaReport};

/// Runs the validation battery with a fixed set of bounds
#[derive(Debug, Clone, Default)]
pub struct Validator {
    bounds: ValidationBounds,
}

impl Validator {
    /// Create a validator
    pub fn new(bounds: ValidationBounds) -> Self {
        Self { bounds }
    }

    /// Bounds in use
    pub fn bounds(&self) -> &ValidationBounds {
        &self.bounds
    }

    /// Validate a file described by `schema`
    pub fn validate(&self, file: &RawInstrumentFile, schema: &SchemaReport) -> ValidationReport {
        if let Some(reason) = &schema.unreadable {
            return unreadable_report(file.path().display().to_string(), reason);
        }
        let mut report = ValidationReport::new(file.path().display().to_string());

        debug!("Step 1: Checking mandatory fields...");
        mandatory::check_mandatory_fields(file, schema, &mut report);

        debug!("Step 2: Checking geographic bounds...");
        ranges::check_geographic_bounds(file, &self.bounds, &mut report);

        debug!("Step 3: Checking physical bounds...");
        ranges::check_physical_bounds(file, schema, &self.bounds, &mut report);

        debug!("Step 4: Checking QC flag vocabulary...");
        flags::check_qc_flags(file, schema, &self.bounds, &mut report);

        info!(
            "{}: {} checks, {} failed{}",
            file.name(),
            report.checks.len(),
            report.failure_count(),
            if report.has_fatal_failures() { " (fatal)" } else { "" }
        );

        report
    }

    /// Validate the result of [`explore_path`](crate::schema::explore_path).
    ///
    /// A file that could not be opened yields a single fatal `file_readable` failure.
    pub fn validate_exploration(&self, exploration: &Exploration) -> ValidationReport {
        match &exploration.file {
            Some(file) => self.validate(file, &exploration.report),
            None => unreadable_report(
                exploration.report.file_name.clone(),
                exploration
                    .report
                    .unreadable
                    .as_deref()
                    .unwrap_or("file could not be opened"),
            ),
        }
    }
}

fn unreadable_report(file_path: String, reason: &str) -> ValidationReport {
    let mut report = ValidationReport::new(file_path);
    report.add_check(
        ValidationCheck::failed("file_readable", CheckCategory::Mandatory, reason).fatal_on_failure(true),
    );
    report
}

#[cfg(test)]
mod tests;