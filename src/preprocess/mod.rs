//! # Data Preprocessor
//!
//! Third pipeline stage. Turns a validated raw file into a row-per-observation
//! table and a row-per-profile summary table.
//!
//! ## Variable selection
//!
//! For every (profile, parameter) pair the data mode is resolved first:
//! `PARAMETER_DATA_MODE` for biogeochemical and synthetic files, then the
//! profile `DATA_MODE`, then real-time with a quality note. Real-time data
//! comes from the raw variable; adjusted and delayed data from the
//! `<PARAM>_ADJUSTED` variable, falling back to the raw variable with a
//! quality note when the file has no adjusted variant.
//!
//! ## QC filtering
//!
//! Every non-fill value of the selected variable is a candidate. A candidate
//! is kept only if its flag is accepted by the [`QcPolicy`], its value lies
//! within the configured physical bounds, and its level has an accepted
//! pressure. Each excluded candidate is counted under exactly one
//! [`DropReason`], so `kept + dropped == candidates` always holds.
//!
//! Pressure is consumed to derive depth and is not emitted as its own
//! observation.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

pub use error::PreprocessError;
pub use stats::{DropReason, FilterStats, NoteKind, ParameterFilterStats, QualityNote};
pub use tables::{ObservationTable, ProcessedObservation, ProfileSummary, ProfileTable, SummaryStats};

mod error;
mod stats;
mod tables;

use tables::StatsAccumulator;

use crate::argo::time::juld_to_datetime;
use crate::argo::{dimensions, variables, DataMode, DepthMethod, Parameter, QcCell, QcFlag};
use crate::config::{PipelineConfig, QcPolicy, ValidationBounds};
use crate::netcdf::{CharArray, NcError, NcFile, NumericArray};
use crate::schema::{ModeScope, RawInstrumentFile, SchemaReport, VariableHandle, VariableSource};
use crate::validator::{CheckCategory, ValidationReport};

/// Result of preprocessing one file
#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    /// Row-per-observation table
    pub observations: ObservationTable,
    /// Row-per-profile table
    pub profiles: ProfileTable,
    /// Filtering counters
    pub stats: FilterStats,
    /// Soft data-quality findings
    pub notes: Vec<QualityNote>,
}

/// Applies variable selection, depth derivation and QC filtering
#[derive(Debug, Clone)]
pub struct Preprocessor {
    bounds: ValidationBounds,
    policy: QcPolicy,
    depth_method: DepthMethod,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl Preprocessor {
    /// Create a preprocessor from the pipeline configuration
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            bounds: config.validation.clone(),
            policy: config.qc.clone(),
            depth_method: config.depth_method,
        }
    }

    /// QC policy in use
    pub fn policy(&self) -> &QcPolicy {
        &self.policy
    }

    /// Depth derivation method in use
    pub fn depth_method(&self) -> DepthMethod {
        self.depth_method
    }

    /// Build the observation and profile tables of a file.
    ///
    /// Refuses files the validator found to lack mandatory fields. Every other
    /// problem degrades to dropped observations, skipped profiles and notes.
    pub fn preprocess(
        &self,
        file: &RawInstrumentFile,
        schema: &SchemaReport,
        validation: &ValidationReport,
    ) -> Result<Preprocessed, PreprocessError> {
        if let Some(reason) = &schema.unreadable {
            return Err(PreprocessError::Unreadable(reason.clone()));
        }
        let missing: Vec<String> = validation
            .failures()
            .filter(|check| check.fatal && check.category == CheckCategory::Mandatory)
            .map(|check| {
                check
                    .name
                    .strip_prefix("mandatory_field:")
                    .unwrap_or(&check.name)
                    .to_string()
            })
            .collect();
        if !missing.is_empty() {
            return Err(PreprocessError::MissingMandatoryFields(missing));
        }

        let nc = file.netcdf();
        let mut run = Run::new(schema);
        run.notes.push(QualityNote::new(
            NoteKind::DepthMethod,
            None,
            format!("{}: {}", self.depth_method.name(), self.depth_method.description()),
        ));

        let columns = load_columns(nc, schema, &mut run.notes)?;
        let header = ProfileHeader::load(nc)?;

        let positioned = schema
            .n_prof
            .min(header.latitude.values.len())
            .min(header.longitude.values.len());
        for profile in 0..positioned {
            self.process_profile(file, schema, &columns, &header, profile, &mut run);
        }
        if positioned < schema.n_prof {
            let unpositioned = schema.n_prof - positioned;
            run.stats.profiles_skipped += unpositioned;
            run.notes.push(QualityNote::new(
                NoteKind::MissingPosition,
                None,
                format!("{unpositioned} profile(s) skipped: no latitude or longitude entry"),
            ));
        }

        let output = run.finish();
        info!(
            "{}: {} profiles, {} observations kept, {} dropped ({} profiles skipped)",
            file.name(),
            output.profiles.len(),
            output.stats.kept(),
            output.stats.dropped(),
            output.stats.profiles_skipped
        );
        Ok(output)
    }

    fn process_profile(
        &self,
        file: &RawInstrumentFile,
        schema: &SchemaReport,
        columns: &BTreeMap<Parameter, ParameterColumns>,
        header: &ProfileHeader,
        profile: usize,
        run: &mut Run,
    ) {
        let latitude = header.latitude.get_flat(profile);
        let longitude = header.longitude.get_flat(profile);
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            run.skip_profile(QualityNote::new(
                NoteKind::MissingPosition,
                None,
                format!("profile {profile} skipped: latitude or longitude missing"),
            ));
            return;
        };
        if !self.bounds.latitude.contains(latitude) || !self.bounds.longitude.contains(longitude) {
            run.skip_profile(QualityNote::new(
                NoteKind::InvalidPosition,
                None,
                format!("profile {profile} skipped: position ({latitude}, {longitude}) out of bounds"),
            ));
            return;
        }

        let float_id = schema
            .platform_number(profile)
            .map(str::to_string)
            .or_else(|| schema.filename_hint.as_ref().and_then(|h| h.float_id.clone()))
            .unwrap_or_else(|| file.stem().to_string());
        let cycle_number = header
            .cycle
            .as_ref()
            .and_then(|c| c.get_flat(profile))
            .map(|c| c as i32);
        let direction = header
            .direction
            .as_ref()
            .and_then(|d| d.char_at(profile))
            .filter(|c| matches!(c, b'A' | b'D'))
            .map_or('A', char::from);
        let profile_id = run.unique_profile_id(profile_id(&float_id, cycle_number, direction, profile));

        let timestamp = header
            .juld
            .get_flat(profile)
            .or_else(|| header.juld_location.as_ref().and_then(|j| j.get_flat(profile)))
            .and_then(juld_to_datetime);
        if timestamp.is_none() {
            run.missing_time += 1;
        }
        let position_qc = header
            .position_qc
            .as_ref()
            .and_then(|q| q.char_at(profile))
            .and_then(|b| match QcCell::from_byte(b) {
                QcCell::Flag(flag) => Some(flag),
                _ => None,
            });

        let pressure = columns
            .get(&Parameter::Pres)
            .and_then(|c| run.select(schema, c, profile));
        let selected: Vec<SelectedColumn<'_>> = columns
            .iter()
            .filter(|(parameter, _)| **parameter != Parameter::Pres)
            .filter_map(|(_, c)| run.select(schema, c, profile))
            .collect();

        let mut present = BTreeSet::new();
        let mut statistics: BTreeMap<Parameter, StatsAccumulator> = BTreeMap::new();
        let mut depth_range: Option<(f64, f64)> = None;
        let mut occupied_levels = 0;
        let mut n_observations = 0;

        // Loaded columns are shaped [N_PROF, N_LEVELS], so the level count is backed by data
        let n_levels = if pressure.is_none() && selected.is_empty() {
            0
        } else {
            schema.n_levels
        };
        for level in 0..n_levels {
            let pressure_value = pressure.as_ref().and_then(|p| p.value(profile, level));
            let occupied = pressure_value.is_some() || selected.iter().any(|c| c.value(profile, level).is_some());
            if !occupied {
                continue;
            }
            occupied_levels += 1;

            let depth = match (pressure.as_ref(), pressure_value) {
                (Some(column), Some(p)) => {
                    if self.pressure_accepted(column.recorded_qc(profile, level), p) {
                        Ok(self.depth_method.depth(p, latitude))
                    } else {
                        Err(DropReason::PressureRejected)
                    }
                }
                _ => Err(DropReason::MissingPressure),
            };

            for column in &selected {
                let stats = run.stats.parameter(column.parameter);
                stats.levels_examined += 1;
                let Some(value) = column.value(profile, level) else {
                    stats.missing_values += 1;
                    // Fill values flagged 9 (or any digit) stay visible in the histogram
                    if let Some(cell @ QcCell::Flag(_)) = column.recorded_qc(profile, level) {
                        *stats.qc_flags.entry(cell.histogram_key()).or_default() += 1;
                    }
                    continue;
                };
                stats.candidates += 1;
                if column.adjusted {
                    stats.from_adjusted += 1;
                } else {
                    stats.from_raw += 1;
                }
                present.insert(column.parameter);

                let cell = column.qc_cell(profile, level);
                *stats.qc_flags.entry(cell.histogram_key()).or_default() += 1;

                let verdict = self.judge(column.parameter, value, cell).and_then(|flag| depth.map(|d| (flag, d)));
                match verdict {
                    Ok((qc_flag, depth)) => {
                        stats.kept += 1;
                        n_observations += 1;
                        statistics.entry(column.parameter).or_default().push(value);
                        depth_range = Some(match depth_range {
                            Some((lo, hi)) => (lo.min(depth), hi.max(depth)),
                            None => (depth, depth),
                        });
                        run.observations.rows.push(ProcessedObservation {
                            profile_id: profile_id.clone(),
                            depth,
                            parameter: column.parameter,
                            value,
                            qc_flag,
                            adjusted_error: column.error(profile, level),
                            data_mode: column.mode,
                        });
                    }
                    Err(reason) => stats.record_drop(reason),
                }
            }
        }

        let parameters: Vec<Parameter> = present.into_iter().collect();
        debug!(
            "{}: {} levels, {} observations, parameters [{}]",
            profile_id,
            occupied_levels,
            n_observations,
            parameters.iter().map(|p| p.name()).collect::<Vec<_>>().join(",")
        );
        run.profiles.rows.push(ProfileSummary {
            profile_id,
            float_id,
            cycle_number,
            direction,
            timestamp,
            latitude,
            longitude,
            position_qc,
            depth_min: depth_range.map(|(lo, _)| lo),
            depth_max: depth_range.map(|(_, hi)| hi),
            n_levels: occupied_levels,
            n_observations,
            has_biogeochemical: parameters.iter().any(|p| p.is_biogeochemical()),
            parameters,
            statistics: statistics
                .iter()
                .filter_map(|(p, acc)| acc.finish().map(|s| (*p, s)))
                .collect(),
            data_mode: schema.data_mode.profile_mode(profile),
        });
    }

    /// Flag of a kept value, or why the value is dropped
    fn judge(&self, parameter: Parameter, value: f64, cell: QcCell) -> Result<QcFlag, DropReason> {
        let flag = match cell {
            QcCell::Flag(flag) if !flag.is_reserved() && self.bounds.flag_in_vocabulary(flag) => flag,
            _ => return Err(DropReason::InvalidQcFlag),
        };
        if !self.policy.accepts(flag) {
            return Err(DropReason::QcFlag);
        }
        if self.policy.drop_out_of_range {
            if let Some(range) = self.bounds.range_for(parameter) {
                if !range.contains(value) {
                    return Err(DropReason::OutOfRange);
                }
            }
        }
        Ok(flag)
    }

    /// A pressure variable without QC variable is judged on its range alone
    fn pressure_accepted(&self, cell: Option<QcCell>, pressure: f64) -> bool {
        let flag_ok = match cell {
            Some(QcCell::Flag(flag)) => self.policy.accepts(flag),
            Some(_) => false,
            None => true,
        };
        flag_ok && (!self.policy.drop_out_of_range || self.bounds.pressure.contains(pressure))
    }
}

/// `<float>_<cycle:03>`, with a `D` suffix for descending profiles
pub fn profile_id(float_id: &str, cycle_number: Option<i32>, direction: char, profile: usize) -> String {
    let suffix = if direction == 'D' { "D" } else { "" };
    match cycle_number {
        Some(cycle) => format!("{float_id}_{cycle:03}{suffix}"),
        None => format!("{float_id}_prof{profile}{suffix}"),
    }
}

/// Per-file accumulation state
struct Run {
    observations: ObservationTable,
    profiles: ProfileTable,
    stats: FilterStats,
    notes: Vec<QualityNote>,
    seen_ids: BTreeSet<String>,
    fallbacks: BTreeMap<Parameter, (String, usize)>,
    undeclared: BTreeMap<Parameter, usize>,
    missing_time: usize,
    scope: ModeScope,
}

impl Run {
    fn new(schema: &SchemaReport) -> Self {
        Self {
            observations: ObservationTable::default(),
            profiles: ProfileTable::default(),
            stats: FilterStats {
                profiles_total: schema.n_prof,
                ..FilterStats::default()
            },
            notes: Vec::new(),
            seen_ids: BTreeSet::new(),
            fallbacks: BTreeMap::new(),
            undeclared: BTreeMap::new(),
            missing_time: 0,
            scope: schema.data_mode.scope,
        }
    }

    fn skip_profile(&mut self, note: QualityNote) {
        warn!("{}", note.message);
        self.stats.profiles_skipped += 1;
        self.notes.push(note);
    }

    fn unique_profile_id(&mut self, candidate: String) -> String {
        if self.seen_ids.insert(candidate.clone()) {
            return candidate;
        }
        let mut n = 2;
        let unique = loop {
            let attempt = format!("{candidate}_{n}");
            if self.seen_ids.insert(attempt.clone()) {
                break attempt;
            }
            n += 1;
        };
        self.notes.push(QualityNote::new(
            NoteKind::DuplicateProfileId,
            None,
            format!("profile id {candidate} repeats within the file; renamed to {unique}"),
        ));
        unique
    }

    /// Resolve the data mode and pick the authoritative column
    fn select<'a>(
        &mut self,
        schema: &SchemaReport,
        columns: &'a ParameterColumns,
        profile: usize,
    ) -> Option<SelectedColumn<'a>> {
        let parameter = columns.parameter;
        let declared = match self.scope {
            ModeScope::PerParameter => schema
                .data_mode
                .parameter_mode(profile, parameter)
                .or_else(|| schema.data_mode.profile_mode(profile)),
            _ => schema.data_mode.profile_mode(profile),
        };
        let mode = declared.unwrap_or_else(|| {
            *self.undeclared.entry(parameter).or_default() += 1;
            DataMode::RealTime
        });

        let selection = schema.lookup(parameter)?.select(mode);
        let (arrays, adjusted) = match selection.source {
            VariableSource::Absent => return None,
            VariableSource::Raw(_) => (columns.raw.as_ref()?, false),
            VariableSource::Adjusted(_) => (columns.adjusted.as_ref()?, true),
        };
        if selection.fell_back {
            let entry = self
                .fallbacks
                .entry(parameter)
                .or_insert_with(|| (mode.label().to_string(), 0));
            entry.1 += 1;
        }
        Some(SelectedColumn {
            parameter,
            mode,
            adjusted,
            arrays,
        })
    }

    fn finish(mut self) -> Preprocessed {
        for (parameter, (mode, count)) in &self.fallbacks {
            let message = format!(
                "{parameter}: {mode} data declared in {count} profile(s) but {} is absent; raw values used",
                parameter.adjusted_name()
            );
            warn!("{message}");
            self.notes
                .push(QualityNote::new(NoteKind::AdjustedFallback, Some(*parameter), message));
        }
        for (parameter, count) in &self.undeclared {
            self.notes.push(QualityNote::new(
                NoteKind::UndeclaredDataMode,
                Some(*parameter),
                format!("{parameter}: no data mode declared in {count} profile(s); real-time assumed"),
            ));
        }
        if self.missing_time > 0 {
            self.notes.push(QualityNote::new(
                NoteKind::MissingTime,
                None,
                format!("{} profile(s) without a valid JULD; timestamp left empty", self.missing_time),
            ));
        }
        Preprocessed {
            observations: self.observations,
            profiles: self.profiles,
            stats: self.stats,
            notes: self.notes,
        }
    }
}

/// Per-profile coordinate and identity variables
struct ProfileHeader {
    juld: NumericArray,
    juld_location: Option<NumericArray>,
    latitude: NumericArray,
    longitude: NumericArray,
    cycle: Option<NumericArray>,
    direction: Option<CharArray>,
    position_qc: Option<CharArray>,
}

impl ProfileHeader {
    fn load(nc: &NcFile) -> Result<Self, NcError> {
        Ok(Self {
            juld: nc.read_numeric(variables::JULD)?,
            juld_location: nc.read_numeric(variables::JULD_LOCATION).ok(),
            latitude: nc.read_numeric(variables::LATITUDE)?,
            longitude: nc.read_numeric(variables::LONGITUDE)?,
            cycle: nc.read_numeric(variables::CYCLE_NUMBER).ok(),
            direction: nc.read_chars(variables::DIRECTION).ok(),
            position_qc: nc.read_chars(variables::POSITION_QC).ok(),
        })
    }
}

/// Arrays of one variant of a parameter, shaped `[N_PROF, N_LEVELS]`
struct VariantArrays {
    values: NumericArray,
    qc: Option<CharArray>,
    error: Option<NumericArray>,
}

struct ParameterColumns {
    parameter: Parameter,
    raw: Option<VariantArrays>,
    adjusted: Option<VariantArrays>,
}

struct SelectedColumn<'a> {
    parameter: Parameter,
    mode: DataMode,
    adjusted: bool,
    arrays: &'a VariantArrays,
}

impl SelectedColumn<'_> {
    fn value(&self, profile: usize, level: usize) -> Option<f64> {
        self.arrays.values.get2(profile, level)
    }

    /// Flag stored in the QC variable, `None` when the variant has none
    fn recorded_qc(&self, profile: usize, level: usize) -> Option<QcCell> {
        let qc = self.arrays.qc.as_ref()?;
        Some(qc.char2(profile, level).map_or(QcCell::Blank, QcCell::from_byte))
    }

    /// A variant without QC variable is treated as "no QC performed"
    fn qc_cell(&self, profile: usize, level: usize) -> QcCell {
        self.recorded_qc(profile, level)
            .unwrap_or(QcCell::Flag(QcFlag::NO_QC))
    }

    fn error(&self, profile: usize, level: usize) -> Option<f64> {
        if !self.adjusted {
            return None;
        }
        self.arrays.error.as_ref().and_then(|e| e.get2(profile, level))
    }
}

fn load_columns(
    nc: &NcFile,
    schema: &SchemaReport,
    notes: &mut Vec<QualityNote>,
) -> Result<BTreeMap<Parameter, ParameterColumns>, NcError> {
    let expected = [schema.n_prof, schema.n_levels];
    let mut columns = BTreeMap::new();
    for (parameter, variants) in &schema.parameters {
        let mut load = |handle: &Option<VariableHandle>| -> Result<Option<VariantArrays>, NcError> {
            let Some(handle) = handle else {
                return Ok(None);
            };
            load_variant(nc, *parameter, handle, &expected, notes)
        };
        let raw = load(&variants.raw)?;
        let adjusted = load(&variants.adjusted)?;
        if raw.is_some() || adjusted.is_some() {
            columns.insert(
                *parameter,
                ParameterColumns {
                    parameter: *parameter,
                    raw,
                    adjusted,
                },
            );
        }
    }
    Ok(columns)
}

fn load_variant(
    nc: &NcFile,
    parameter: Parameter,
    handle: &VariableHandle,
    expected: &[usize; 2],
    notes: &mut Vec<QualityNote>,
) -> Result<Option<VariantArrays>, NcError> {
    let values = nc.read_numeric(&handle.value)?;
    if values.shape != expected {
        notes.push(QualityNote::new(
            NoteKind::UnexpectedShape,
            Some(parameter),
            format!(
                "{} has shape {:?}, expected [{}, {}] ({} x {}); ignored",
                handle.value,
                values.shape,
                expected[0],
                expected[1],
                dimensions::N_PROF,
                dimensions::N_LEVELS
            ),
        ));
        return Ok(None);
    }

    let qc = handle
        .qc
        .as_deref()
        .and_then(|name| nc.read_chars(name).ok())
        .filter(|qc| qc.shape == expected);
    if qc.is_none() {
        let consequence = if parameter == Parameter::Pres {
            "levels judged on the pressure bounds alone"
        } else {
            "flag 0 (no QC) assumed"
        };
        notes.push(QualityNote::new(
            NoteKind::MissingQcVariable,
            Some(parameter),
            format!("{} has no usable QC variable; {}", handle.value, consequence),
        ));
    }
    let error = handle
        .error
        .as_deref()
        .and_then(|name| nc.read_numeric(name).ok())
        .filter(|e| e.shape == expected);

    Ok(Some(VariantArrays { values, qc, error }))
}
