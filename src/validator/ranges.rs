use crate::argo::{variables, Parameter};
use crate::config::{ValidationBounds, ValueRange};
use crate::netcdf::{NcError, NcFile};
use crate::schema::{RawInstrumentFile, SchemaReport};

use super::{CheckCategory, ValidationCheck, ValidationReport};

/// Values of a variable compared against a range; fill values are skipped
#[derive(Debug, Default, PartialEq)]
struct RangeScan {
    examined: usize,
    outside: usize,
    worst: Option<f64>,
}

impl RangeScan {
    fn run(nc: &NcFile, name: &str, range: ValueRange) -> Result<Self, NcError> {
        let array = nc.read_numeric(name)?;
        let mut scan = RangeScan::default();
        let mut worst_distance = 0.0;
        for value in array.values.iter().copied().filter(|v| !array.is_missing(*v)) {
            scan.examined += 1;
            if !range.contains(value) {
                scan.outside += 1;
                let distance = (value - range.min).abs().min((value - range.max).abs());
                if scan.worst.is_none() || distance > worst_distance {
                    worst_distance = distance;
                    scan.worst = Some(value);
                }
            }
        }
        Ok(scan)
    }

    fn into_check(
        self,
        name: String,
        category: CheckCategory,
        variable: &str,
        range: ValueRange,
    ) -> ValidationCheck {
        if self.outside > 0 {
            ValidationCheck::failed(
                name,
                category,
                format!(
                    "{} of {} {} values outside [{}, {}] (e.g. {})",
                    self.outside,
                    self.examined,
                    variable,
                    range.min,
                    range.max,
                    self.worst.unwrap_or(f64::NAN)
                ),
            )
        } else if self.examined == 0 {
            ValidationCheck::warning(name, category, format!("{variable} holds only fill values"))
        } else {
            ValidationCheck::ok(name, category)
        }
    }
}

/// Latitude and longitude bounds
pub(super) fn check_geographic_bounds(
    file: &RawInstrumentFile,
    bounds: &ValidationBounds,
    report: &mut ValidationReport,
) {
    let nc = file.netcdf();
    let checks = [
        ("latitude_bounds", variables::LATITUDE, bounds.latitude),
        ("longitude_bounds", variables::LONGITUDE, bounds.longitude),
    ];
    for (check_name, variable, range) in checks {
        if !nc.has_variable(variable) {
            continue;
        }
        let check = match RangeScan::run(nc, variable, range) {
            Ok(scan) => scan.into_check(check_name.to_string(), CheckCategory::Geographic, variable, range),
            Err(e) => ValidationCheck::failed(check_name, CheckCategory::Geographic, e.to_string()),
        };
        report.add_check(check.fatal_on_failure(bounds.reject_invalid_position));
    }
}

/// Physical bounds of every parameter variant that has a configured range
pub(super) fn check_physical_bounds(
    file: &RawInstrumentFile,
    schema: &SchemaReport,
    bounds: &ValidationBounds,
    report: &mut ValidationReport,
) {
    let nc = file.netcdf();
    for parameter in Parameter::ALL {
        let (Some(range), Some(variants)) = (bounds.range_for(parameter), schema.lookup(parameter)) else {
            continue;
        };
        for handle in [&variants.raw, &variants.adjusted].into_iter().flatten() {
            let check_name = format!("physical_range:{}", handle.value);
            let check = match RangeScan::run(nc, &handle.value, range) {
                Ok(scan) => scan.into_check(check_name, CheckCategory::Physical, &handle.value, range),
                Err(e) => ValidationCheck::failed(check_name, CheckCategory::Physical, e.to_string()),
            };
            report.add_check(check);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netcdf::{NcValues, NcWriter};

    #[test]
    fn test_scan_skips_fill_and_tracks_worst() {
        let mut writer = NcWriter::new();
        writer.add_dimension("N", 5).unwrap();
        writer
            .add_variable("X", &["N"], NcValues::Doubles(vec![10.0, 95.0, 99999.0, -91.0, 120.0]))
            .unwrap();
        writer
            .add_variable_attribute("X", "_FillValue", NcValues::Doubles(vec![99999.0]))
            .unwrap();
        let nc = NcFile::from_bytes(writer.to_bytes().unwrap()).unwrap();

        let scan = RangeScan::run(&nc, "X", ValueRange::new(-90.0, 90.0)).unwrap();
        assert_eq!(scan.examined, 4);
        assert_eq!(scan.outside, 3);
        assert_eq!(scan.worst, Some(120.0));
    }

    #[test]
    fn test_all_fill_is_a_warning() {
        let scan = RangeScan::default();
        let check = scan.into_check(
            "latitude_bounds".to_string(),
            CheckCategory::Geographic,
            "LATITUDE",
            ValueRange::new(-90.0, 90.0),
        );
        assert!(check.passed());
        assert!(matches!(check.status, crate::validator::CheckStatus::Warning(_)));
    }
}
