use std::collections::BTreeMap;

use serde::Serialize;

use super::classify::VariableGroup;
use super::filename::FilenameHint;
use super::lookup::ParameterVariants;
use crate::argo::{variables, DataMode, FileCategory, Parameter};
use crate::netcdf::Dimension;

/// How the file category was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// `DATA_TYPE` variable
    DataType,
    /// Global `title` / `featureType` attributes
    GlobalAttribute,
    /// Presence of per-parameter mode variables
    Structure,
    /// File name prefix or suffix
    Filename,
    /// Nothing conclusive; assumed core
    Default,
}

/// Where data modes are declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeScope {
    /// One `DATA_MODE` per profile, shared by every parameter
    FileLevel,
    /// `PARAMETER_DATA_MODE`, one mode per parameter and profile
    PerParameter,
    /// No data-mode variable found
    Undeclared,
}

/// Data-mode indicators found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataModeDeclaration {
    /// Which indicator governs parameter selection
    pub scope: ModeScope,
    /// `DATA_MODE` per profile
    pub profile_modes: Vec<Option<DataMode>>,
    /// `PARAMETER_DATA_MODE` per profile, keyed by `STATION_PARAMETERS` entry
    pub parameter_modes: Vec<BTreeMap<Parameter, DataMode>>,
}

impl DataModeDeclaration {
    pub(crate) fn undeclared() -> Self {
        Self {
            scope: ModeScope::Undeclared,
            profile_modes: Vec::new(),
            parameter_modes: Vec::new(),
        }
    }

    /// `DATA_MODE` of a profile
    pub fn profile_mode(&self, profile: usize) -> Option<DataMode> {
        self.profile_modes.get(profile).copied().flatten()
    }

    /// Per-parameter mode of a profile
    pub fn parameter_mode(&self, profile: usize, parameter: Parameter) -> Option<DataMode> {
        self.parameter_modes
            .get(profile)
            .and_then(|modes| modes.get(&parameter))
            .copied()
    }

    /// The single mode shared by every profile, if there is one
    pub fn file_level_mode(&self) -> Option<DataMode> {
        let first = self.profile_modes.first().copied().flatten()?;
        self.profile_modes
            .iter()
            .all(|m| *m == Some(first))
            .then_some(first)
    }
}

/// Description of one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableInfo {
    /// Variable name
    pub name: String,
    /// NetCDF external type
    pub dtype: &'static str,
    /// Dimension names
    pub dimensions: Vec<String>,
    /// Dimension lengths
    pub shape: Vec<usize>,
    /// Assigned group
    pub group: VariableGroup,
    /// `units` attribute
    pub units: Option<String>,
    /// `valid_min` attribute
    pub valid_min: Option<f64>,
    /// `valid_max` attribute
    pub valid_max: Option<f64>,
    /// All attributes rendered as text
    pub attributes: BTreeMap<String, String>,
}

/// Structured description of one raw instrument file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaReport {
    /// File name
    pub file_name: String,
    /// Reason the file could not be read; the rest of the report is partial
    pub unreadable: Option<String>,
    /// Container format label
    pub format: Option<String>,
    /// File size in bytes
    pub size_bytes: u64,
    /// Dimensions in declaration order
    pub dimensions: Vec<Dimension>,
    /// Variables in declaration order
    pub variables: Vec<VariableInfo>,
    /// Global attributes rendered as text
    pub global_attributes: BTreeMap<String, String>,
    /// Detected file category
    pub category: FileCategory,
    /// Evidence used for the category
    pub category_source: CategorySource,
    /// Data-mode indicators
    pub data_mode: DataModeDeclaration,
    /// What the file name claims
    pub filename_hint: Option<FilenameHint>,
    /// Number of profiles (`N_PROF`)
    pub n_prof: usize,
    /// Number of levels per profile (`N_LEVELS`)
    pub n_levels: usize,
    /// Variants found for each known parameter
    pub parameters: BTreeMap<Parameter, ParameterVariants>,
    /// Per-level measurement variables that match no known parameter
    pub unknown_measurements: Vec<String>,
    /// Decoded character metadata, one entry per fixed-width string
    pub text_fields: BTreeMap<String, Vec<String>>,
    /// Soft problems found while exploring
    pub warnings: Vec<String>,
}

impl SchemaReport {
    pub(crate) fn empty(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            unreadable: None,
            format: None,
            size_bytes: 0,
            dimensions: Vec::new(),
            variables: Vec::new(),
            global_attributes: BTreeMap::new(),
            category: FileCategory::Core,
            category_source: CategorySource::Default,
            data_mode: DataModeDeclaration::undeclared(),
            filename_hint: None,
            n_prof: 0,
            n_levels: 0,
            parameters: BTreeMap::new(),
            unknown_measurements: Vec::new(),
            text_fields: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Whether the file could be read
    pub fn is_readable(&self) -> bool {
        self.unreadable.is_none()
    }

    /// Variable description by name
    pub fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Whether a variable is declared
    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Number of variables in a group
    pub fn group_count(&self, group: VariableGroup) -> usize {
        self.variables.iter().filter(|v| v.group == group).count()
    }

    /// Variants of a parameter, `None` when the file has neither
    pub fn lookup(&self, parameter: Parameter) -> Option<&ParameterVariants> {
        self.parameters.get(&parameter)
    }

    /// Parameters present in the file, core first
    pub fn parameters_present(&self) -> Vec<Parameter> {
        self.parameters.keys().copied().collect()
    }

    /// Whether any biogeochemical parameter is present
    pub fn has_biogeochemical(&self) -> bool {
        self.parameters.keys().any(|p| p.is_biogeochemical())
    }

    /// Decoded `PLATFORM_NUMBER` of a profile
    pub fn platform_number(&self, profile: usize) -> Option<&str> {
        self.text_entry(variables::PLATFORM_NUMBER, profile)
    }

    /// Decoded text entry of a character field
    pub fn text_entry(&self, field: &str, index: usize) -> Option<&str> {
        self.text_fields
            .get(field)
            .and_then(|entries| entries.get(index))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}
