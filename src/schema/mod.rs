//! # Schema Explorer
//!
//! First pipeline stage. Opens a raw ARGO NetCDF file and describes it
//! without interpreting measurement values:
//!
//! - every variable is assigned to exactly one [`VariableGroup`]
//! - fixed-width character metadata is decoded with [`decode_text`]
//! - the file category (core, biogeochemical, synthetic, trajectory) is
//!   decided from the file content, using the file name only as a hint
//! - data-mode indicators are collected, per profile for core files and per
//!   parameter for biogeochemical and synthetic files
//! - the raw/adjusted variables of every known [`Parameter`] are resolved
//!   once, so later stages never probe variable names again
//!
//! Exploration never fails. A file that cannot be parsed produces a report
//! with [`SchemaReport::unreadable`] set.

mod classify;
mod filename;
mod lookup;
mod report;
mod text;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

pub use classify::{classify, measurement_base, VariableGroup};
pub use filename::{parse_filename, FilenameHint};
pub use lookup::{ParameterVariants, Selection, VariableHandle, VariableSource};
pub use report::{CategorySource, DataModeDeclaration, ModeScope, SchemaReport, VariableInfo};
pub use text::{decode_lossy, decode_text, DecodeIssue, DecodeWarning};

use crate::argo::{dimensions, variables, DataMode, FileCategory, Parameter};
use crate::netcdf::{NcError, NcFile, NcValues};

/// Character fields decoded into [`SchemaReport::text_fields`]
const TEXT_FIELDS: [&str; 12] = [
    variables::PLATFORM_NUMBER,
    "PROJECT_NAME",
    "PI_NAME",
    "DATA_CENTRE",
    "PLATFORM_TYPE",
    variables::FORMAT_VERSION,
    variables::DATA_TYPE,
    variables::DATA_MODE,
    variables::STATION_PARAMETERS,
    variables::PARAMETER_DATA_MODE,
    variables::DIRECTION,
    variables::SCIENTIFIC_CALIB_COMMENT,
];

/// A raw ARGO NetCDF file, read once and never modified
#[derive(Debug, Clone)]
pub struct RawInstrumentFile {
    path: PathBuf,
    name: String,
    netcdf: NcFile,
}

impl RawInstrumentFile {
    /// Read and parse a file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, NcError> {
        let path = path.as_ref();
        let netcdf = NcFile::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            name: file_name_of(path),
            netcdf,
        })
    }

    /// Wrap an already parsed container
    pub fn from_netcdf(name: impl Into<String>, netcdf: NcFile) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            netcdf,
        }
    }

    /// Path the file was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without extension
    pub fn stem(&self) -> &str {
        self.name.strip_suffix(".nc").unwrap_or(&self.name)
    }

    /// Parsed container
    pub fn netcdf(&self) -> &NcFile {
        &self.netcdf
    }
}

/// Result of exploring a path: the opened file (when readable) and its report
#[derive(Debug)]
pub struct Exploration {
    /// The file, `None` when it could not be opened
    pub file: Option<RawInstrumentFile>,
    /// Schema report, partial when the file is unreadable
    pub report: SchemaReport,
}

/// Open and explore a file
pub fn explore_path<P: AsRef<Path>>(path: P) -> Exploration {
    let path = path.as_ref();
    match RawInstrumentFile::open(path) {
        Ok(file) => {
            let report = explore(&file);
            Exploration {
                file: Some(file),
                report,
            }
        }
        Err(e) => {
            let name = file_name_of(path);
            warn!("{}: unreadable: {}", name, e);
            let mut report = SchemaReport::empty(&name);
            report.filename_hint = parse_filename(&name);
            report.unreadable = Some(e.to_string());
            Exploration { file: None, report }
        }
    }
}

/// Describe an opened file
pub fn explore(file: &RawInstrumentFile) -> SchemaReport {
    let nc = file.netcdf();
    let mut report = SchemaReport::empty(file.name());
    report.filename_hint = parse_filename(file.name());
    report.format = Some(nc.version().label().to_string());
    report.size_bytes = nc.size_bytes();
    report.dimensions = nc.dimensions().to_vec();

    report.n_prof = nc.dimension(dimensions::N_PROF).map_or(0, |d| d.length);
    report.n_levels = nc.dimension(dimensions::N_LEVELS).map_or(0, |d| d.length);

    for attribute in nc.global_attributes() {
        report
            .global_attributes
            .insert(attribute.name.clone(), render_value(&attribute.value));
    }

    for var in nc.variables() {
        let group = classify(&var.name, var.nc_type, &var.dimensions);
        let attributes = var
            .attributes
            .iter()
            .map(|a| (a.name.clone(), render_value(&a.value)))
            .collect();
        report.variables.push(VariableInfo {
            name: var.name.clone(),
            dtype: var.nc_type.name(),
            dimensions: var.dimensions.clone(),
            shape: var.shape.clone(),
            group,
            units: var.units(),
            valid_min: var.attribute("valid_min").and_then(|a| a.value.first_f64()),
            valid_max: var.attribute("valid_max").and_then(|a| a.value.first_f64()),
            attributes,
        });
    }

    decode_text_fields(nc, &mut report);
    resolve_parameters(nc, &mut report);

    let (category, source) = detect_category(&report);
    report.category = category;
    report.category_source = source;
    report.data_mode = detect_data_modes(nc, &mut report);
    compare_with_filename(&mut report);

    debug!(
        "{}: {} variables, category {} ({:?}), {} profiles x {} levels",
        file.name(),
        report.variables.len(),
        report.category,
        report.category_source,
        report.n_prof,
        report.n_levels
    );
    for warning in &report.warnings {
        warn!("{}: {}", file.name(), warning);
    }

    report
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn render_value(value: &NcValues) -> String {
    fn join<T: ToString>(values: &[T]) -> String {
        values.iter().map(T::to_string).collect::<Vec<_>>().join(", ")
    }
    match value {
        NcValues::Chars(bytes) => decode_lossy(bytes),
        NcValues::Bytes(v) => join(v),
        NcValues::Shorts(v) => join(v),
        NcValues::Ints(v) => join(v),
        NcValues::Floats(v) => join(v),
        NcValues::Doubles(v) => join(v),
    }
}

fn decode_text_fields(nc: &NcFile, report: &mut SchemaReport) {
    for field in TEXT_FIELDS {
        if !nc.has_variable(field) {
            continue;
        }
        let chars = match nc.read_chars(field) {
            Ok(chars) => chars,
            Err(e) => {
                report.warnings.push(format!("{field}: {e}"));
                continue;
            }
        };
        let width = chars.string_len().max(1);
        let count = chars.bytes.len() / width;
        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let Some(raw) = chars.string_at(index) else {
                break;
            };
            match decode_text(raw) {
                Ok(text) => entries.push(text),
                Err(warning) => {
                    report.warnings.push(format!("{field}[{index}]: {warning}"));
                    entries.push(warning.into_text());
                }
            }
        }
        if field == variables::SCIENTIFIC_CALIB_COMMENT {
            let mut distinct: Vec<String> = Vec::new();
            for entry in entries {
                if !entry.is_empty() && !distinct.contains(&entry) {
                    distinct.push(entry);
                }
            }
            entries = distinct;
        }
        report.text_fields.insert(field.to_string(), entries);
    }
}

fn resolve_parameters(nc: &NcFile, report: &mut SchemaReport) {
    let numeric = |name: &str| nc.variable(name).is_some_and(|v| v.nc_type.is_numeric());
    let present = |name: String| nc.has_variable(&name).then_some(name);

    for parameter in Parameter::ALL {
        let raw_name = parameter.name();
        let adjusted_name = parameter.adjusted_name();

        let raw = numeric(raw_name).then(|| VariableHandle {
            value: raw_name.to_string(),
            qc: present(classify::qc_name(raw_name)),
            error: None,
        });
        let adjusted = numeric(&adjusted_name).then(|| VariableHandle {
            value: adjusted_name.clone(),
            qc: present(classify::qc_name(&adjusted_name)),
            error: present(classify::adjusted_error_name(raw_name)).filter(|n| numeric(n.as_str())),
        });

        let variants = ParameterVariants { raw, adjusted };
        if !variants.is_empty() {
            debug!(
                "{}: raw={} adjusted={}",
                raw_name,
                variants.raw.is_some(),
                variants.adjusted.is_some()
            );
            report.parameters.insert(parameter, variants);
        }
    }

    report.unknown_measurements = report
        .variables
        .iter()
        .filter(|v| v.group == VariableGroup::Measurement)
        .filter(|v| Parameter::from_name(&v.name).is_none())
        .map(|v| v.name.clone())
        .collect();
}

fn detect_category(report: &SchemaReport) -> (FileCategory, CategorySource) {
    if let Some(data_type) = report.text_entry(variables::DATA_TYPE, 0) {
        if let Some(category) = category_from_text(data_type, true) {
            return (category, CategorySource::DataType);
        }
    }

    for key in ["featureType", "title"] {
        if let Some(category) = report
            .global_attributes
            .get(key)
            .and_then(|value| category_from_text(value, false))
        {
            return (category, CategorySource::GlobalAttribute);
        }
    }

    if report.has_variable(variables::PARAMETER_DATA_MODE) {
        return (FileCategory::Biogeochemical, CategorySource::Structure);
    }

    if let Some(category) = report.filename_hint.as_ref().and_then(|h| h.category) {
        return (category, CategorySource::Filename);
    }

    if report.has_variable(variables::DATA_MODE) {
        (FileCategory::Core, CategorySource::Structure)
    } else {
        (FileCategory::Core, CategorySource::Default)
    }
}

/// Interpret a `DATA_TYPE` value (`generic` also accepts a plain "profile")
/// or a global attribute
fn category_from_text(text: &str, generic: bool) -> Option<FileCategory> {
    let text = text.to_ascii_lowercase();
    if text.contains("traj") && !text.contains("profile") {
        Some(FileCategory::Trajectory)
    } else if text.contains("synthetic") || text.contains("s-argo") {
        Some(FileCategory::Synthetic)
    } else if text.contains("b-argo") || text.contains("bio-argo") || text.contains("biogeochemical") {
        Some(FileCategory::Biogeochemical)
    } else if generic && text.contains("profile") {
        Some(FileCategory::Core)
    } else {
        None
    }
}

fn detect_data_modes(nc: &NcFile, report: &mut SchemaReport) -> DataModeDeclaration {
    let mut declaration = DataModeDeclaration::undeclared();

    if let Ok(modes) = nc.read_chars(variables::DATA_MODE) {
        declaration.scope = ModeScope::FileLevel;
        let count = if report.n_prof > 0 {
            report.n_prof.min(modes.bytes.len())
        } else {
            modes.bytes.len()
        };
        for profile in 0..count {
            let mode = modes.char_at(profile).and_then(DataMode::from_char);
            if mode.is_none() {
                report
                    .warnings
                    .push(format!("DATA_MODE[{profile}]: missing or invalid data mode"));
            }
            declaration.profile_modes.push(mode);
        }
    }

    if !report.category.has_parameter_modes() {
        return declaration;
    }

    let (Ok(stations), Ok(modes)) = (
        nc.read_chars(variables::STATION_PARAMETERS),
        nc.read_chars(variables::PARAMETER_DATA_MODE),
    ) else {
        report.warnings.push(format!(
            "{} file without STATION_PARAMETERS/PARAMETER_DATA_MODE; using DATA_MODE",
            report.category
        ));
        return declaration;
    };

    declaration.scope = ModeScope::PerParameter;
    let n_param = modes.shape.get(1).copied().unwrap_or(0);
    let n_rows = modes.shape.first().copied().unwrap_or(0).min(report.n_prof);
    for profile in 0..n_rows {
        let mut per_parameter = BTreeMap::new();
        for column in 0..n_param {
            let Some(name) = stations.string_at(profile * n_param + column).map(decode_lossy) else {
                continue;
            };
            let Some(parameter) = Parameter::from_name(&name) else {
                continue;
            };
            match modes.char2(profile, column).and_then(DataMode::from_char) {
                Some(mode) => {
                    per_parameter.insert(parameter, mode);
                }
                None => report.warnings.push(format!(
                    "PARAMETER_DATA_MODE[{profile}][{column}] ({name}): missing or invalid data mode"
                )),
            }
        }
        declaration.parameter_modes.push(per_parameter);
    }

    declaration
}

fn compare_with_filename(report: &mut SchemaReport) {
    let Some(hint) = report.filename_hint.clone() else {
        return;
    };

    if let Some(claimed) = hint.category {
        let from_content = !matches!(
            report.category_source,
            CategorySource::Filename | CategorySource::Default
        );
        if from_content && claimed != report.category {
            report.warnings.push(format!(
                "file name suggests a {claimed} file but content declares {}",
                report.category
            ));
        }
    }

    let Some(claimed) = hint.data_mode else {
        return;
    };
    let modes = &report.data_mode.profile_modes;
    let contradicted = match claimed {
        DataMode::Delayed => modes.iter().flatten().any(|m| *m != DataMode::Delayed),
        _ => modes.iter().flatten().any(|m| *m == DataMode::Delayed),
    };
    if contradicted {
        report.warnings.push(format!(
            "file name suggests {claimed} data but DATA_MODE disagrees; DATA_MODE is used"
        ));
    }
}

#[cfg(test)]
mod tests;
