use crate::argo::{variables, Parameter};
use crate::schema::{RawInstrumentFile, SchemaReport};

use super::{CheckCategory, ValidationCheck, ValidationReport};

/// Time, position and pressure must exist as numeric variables
pub(super) fn check_mandatory_fields(
    file: &RawInstrumentFile,
    schema: &SchemaReport,
    report: &mut ValidationReport,
) {
    let nc = file.netcdf();

    for name in [variables::JULD, variables::LATITUDE, variables::LONGITUDE] {
        let check_name = format!("mandatory_field:{name}");
        let check = match nc.variable(name) {
            Some(var) if var.nc_type.is_numeric() => {
                ValidationCheck::ok(check_name, CheckCategory::Mandatory)
            }
            Some(var) => ValidationCheck::failed(
                check_name,
                CheckCategory::Mandatory,
                format!("{name} is {} instead of numeric", var.nc_type.name()),
            ),
            None => ValidationCheck::failed(
                check_name,
                CheckCategory::Mandatory,
                format!("variable {name} not found"),
            ),
        };
        report.add_check(check.fatal_on_failure(true));
    }

    let pressure = Parameter::Pres;
    let check_name = format!("mandatory_field:{}", pressure.name());
    let check = if schema.lookup(pressure).is_some() {
        ValidationCheck::ok(check_name, CheckCategory::Mandatory)
    } else {
        ValidationCheck::failed(
            check_name,
            CheckCategory::Mandatory,
            format!(
                "neither {} nor {} found",
                pressure.name(),
                pressure.adjusted_name()
            ),
        )
    };
    report.add_check(check.fatal_on_failure(true));

    if schema.n_prof == 0 {
        report.add_check(ValidationCheck::warning(
            "profile_count",
            CheckCategory::Mandatory,
            "file declares no profiles",
        ));
    }
}
