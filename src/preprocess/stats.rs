use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::argo::Parameter;

/// Why a candidate observation was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// No pressure at that level, so no depth
    MissingPressure,
    /// Level pressure failed QC or lies outside the pressure bounds
    PressureRejected,
    /// Reserved (6, 7), blank, non-digit or out-of-vocabulary flag
    InvalidQcFlag,
    /// Flag not accepted by the QC policy
    QcFlag,
    /// Value outside the configured physical bounds
    OutOfRange,
}

impl DropReason {
    /// Snake-case name used in reports
    pub fn name(self) -> &'static str {
        match self {
            DropReason::MissingPressure => "missing_pressure",
            DropReason::PressureRejected => "pressure_rejected",
            DropReason::InvalidQcFlag => "invalid_qc_flag",
            DropReason::QcFlag => "qc_flag",
            DropReason::OutOfRange => "out_of_range",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filtering counters of one parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterFilterStats {
    /// Occupied levels examined in profiles carrying the parameter
    pub levels_examined: u64,
    /// Examined levels holding a fill value
    pub missing_values: u64,
    /// Non-fill values considered for output
    pub candidates: u64,
    /// Candidates emitted
    pub kept: u64,
    /// Candidates excluded, by reason
    pub dropped: BTreeMap<DropReason, u64>,
    /// Flag distribution of the candidates (`"1"`, `"4"`, `"blank"`, ...),
    /// plus the digit flags carried by fill values
    pub qc_flags: BTreeMap<String, u64>,
    /// Candidates taken from the adjusted variable
    pub from_adjusted: u64,
    /// Candidates taken from the raw variable
    pub from_raw: u64,
}

impl ParameterFilterStats {
    /// Total excluded candidates
    pub fn dropped_total(&self) -> u64 {
        self.dropped.values().sum()
    }

    /// Share of examined levels holding a value
    pub fn completeness(&self) -> f64 {
        if self.levels_examined == 0 {
            0.0
        } else {
            (self.levels_examined - self.missing_values) as f64 / self.levels_examined as f64
        }
    }

    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_default() += 1;
    }
}

/// Filtering counters of a whole file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterStats {
    /// Per-parameter counters
    pub parameters: BTreeMap<Parameter, ParameterFilterStats>,
    /// Profiles in the file
    pub profiles_total: usize,
    /// Profiles skipped entirely
    pub profiles_skipped: usize,
}

impl FilterStats {
    pub(crate) fn parameter(&mut self, parameter: Parameter) -> &mut ParameterFilterStats {
        self.parameters.entry(parameter).or_default()
    }

    /// Candidates over all parameters
    pub fn candidates(&self) -> u64 {
        self.parameters.values().map(|p| p.candidates).sum()
    }

    /// Emitted observations over all parameters
    pub fn kept(&self) -> u64 {
        self.parameters.values().map(|p| p.kept).sum()
    }

    /// Excluded observations over all parameters
    pub fn dropped(&self) -> u64 {
        self.parameters.values().map(ParameterFilterStats::dropped_total).sum()
    }

    /// Excluded observations by reason, over all parameters
    pub fn dropped_by_reason(&self) -> BTreeMap<DropReason, u64> {
        let mut totals = BTreeMap::new();
        for stats in self.parameters.values() {
            for (reason, count) in &stats.dropped {
                *totals.entry(*reason).or_default() += count;
            }
        }
        totals
    }
}

/// Kind of a data-quality note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// Depth derivation method in use
    DepthMethod,
    /// Adjusted data claimed but only the raw variable exists
    AdjustedFallback,
    /// No data mode declared; real-time assumed
    UndeclaredDataMode,
    /// No QC variable for a parameter; flag 0 assumed
    MissingQcVariable,
    /// Variable with an unexpected shape was ignored
    UnexpectedShape,
    /// Profile without a usable position was skipped
    MissingPosition,
    /// Profile with an out-of-bounds position was skipped
    InvalidPosition,
    /// Profile without a usable time
    MissingTime,
    /// Duplicate profile identifier was disambiguated
    DuplicateProfileId,
}

/// A soft data-quality finding carried into the quality report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityNote {
    /// Finding kind
    pub kind: NoteKind,
    /// Parameter concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<Parameter>,
    /// Human-readable description
    pub message: String,
}

impl QualityNote {
    /// Create a note
    pub fn new(kind: NoteKind, parameter: Option<Parameter>, message: impl Into<String>) -> Self {
        Self {
            kind,
            parameter,
            message: message.into(),
        }
    }
}

impl fmt::Display for QualityNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
