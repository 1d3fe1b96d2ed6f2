use std::collections::BTreeMap;

use crate::argo::{dimensions, QcCell};
use crate::config::ValidationBounds;
use crate::netcdf::NcType;
use crate::schema::{RawInstrumentFile, SchemaReport, VariableGroup};

use super::{CheckCategory, ValidationCheck, ValidationReport};

/// Profile-level grades (`PROFILE_TEMP_QC`, A-F) use a different vocabulary
const PROFILE_GRADE_PREFIX: &str = "PROFILE_";

/// Flag vocabulary of every QC variable, plus the per-variable histogram
pub(super) fn check_qc_flags(
    file: &RawInstrumentFile,
    schema: &SchemaReport,
    bounds: &ValidationBounds,
    report: &mut ValidationReport,
) {
    let nc = file.netcdf();
    let qc_variables = schema.variables.iter().filter(|v| {
        v.group == VariableGroup::QualityFlag
            && !v.name.starts_with(PROFILE_GRADE_PREFIX)
            && v.dtype == NcType::Char.name()
    });

    for info in qc_variables {
        let check_name = format!("qc_vocabulary:{}", info.name);
        let flags = match nc.read_chars(&info.name) {
            Ok(flags) => flags,
            Err(e) => {
                report.add_check(ValidationCheck::failed(check_name, CheckCategory::QcVocabulary, e.to_string()));
                continue;
            }
        };

        let mut histogram: BTreeMap<String, u64> = BTreeMap::new();
        let mut offending: BTreeMap<String, u64> = BTreeMap::new();
        for byte in &flags.bytes {
            let cell = QcCell::from_byte(*byte);
            *histogram.entry(cell.histogram_key()).or_default() += 1;
            let bad = match cell {
                QcCell::Flag(flag) => !bounds.flag_in_vocabulary(flag),
                QcCell::Blank => false,
                QcCell::Invalid(_) => true,
            };
            if bad {
                let key = match cell {
                    QcCell::Invalid(b) => format!("{:?}", b as char),
                    other => other.histogram_key(),
                };
                *offending.entry(key).or_default() += 1;
            }
        }

        let per_level = info.dimensions.iter().any(|d| d == dimensions::N_LEVELS);
        if per_level {
            let value_name = info.name.strip_suffix("_QC").unwrap_or(&info.name);
            report.qc_histogram.insert(value_name.to_string(), histogram);
        }

        let check = if offending.is_empty() {
            ValidationCheck::ok(check_name, CheckCategory::QcVocabulary)
        } else {
            let listed: Vec<String> = offending
                .iter()
                .map(|(flag, count)| format!("{flag} (x{count})"))
                .collect();
            ValidationCheck::failed(
                check_name,
                CheckCategory::QcVocabulary,
                format!("flags outside the QC vocabulary: {}", listed.join(", ")),
            )
        };
        report.add_check(check);
    }
}
