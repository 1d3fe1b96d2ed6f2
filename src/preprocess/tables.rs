use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::argo::{DataMode, Parameter, QcFlag};

/// One measurement of one parameter at one level of one profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedObservation {
    /// Owning profile
    pub profile_id: String,
    /// Depth in metres, derived from pressure
    pub depth: f64,
    /// Measured quantity
    pub parameter: Parameter,
    /// Authoritative value (raw or adjusted, per the data mode)
    pub value: f64,
    /// QC flag of the selected variable
    pub qc_flag: QcFlag,
    /// Uncertainty estimate of the adjusted value
    pub adjusted_error: Option<f64>,
    /// Data mode that governed the selection
    pub data_mode: DataMode,
}

/// Row-per-observation table, ordered by profile, level, parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    /// Rows
    pub rows: Vec<ProcessedObservation>,
}

impl ObservationTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows
    pub fn iter(&self) -> impl Iterator<Item = &ProcessedObservation> {
        self.rows.iter()
    }

    /// Rows of one parameter
    pub fn for_parameter(&self, parameter: Parameter) -> impl Iterator<Item = &ProcessedObservation> {
        self.rows.iter().filter(move |row| row.parameter == parameter)
    }

    /// Rows of one profile
    pub fn for_profile<'a>(&'a self, profile_id: &'a str) -> impl Iterator<Item = &'a ProcessedObservation> {
        self.rows.iter().filter(move |row| row.profile_id == profile_id)
    }
}

/// Min, mean and max of the kept values of a parameter within a profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Smallest value
    pub min: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Largest value
    pub max: f64,
    /// Number of values
    pub count: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsAccumulator {
    min: f64,
    max: f64,
    sum: f64,
    count: usize,
}

impl StatsAccumulator {
    pub(crate) fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    pub(crate) fn finish(&self) -> Option<SummaryStats> {
        (self.count > 0).then(|| SummaryStats {
            min: self.min,
            mean: self.sum / self.count as f64,
            max: self.max,
            count: self.count,
        })
    }
}

/// One row per profile (cycle)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    /// Unique profile identifier
    pub profile_id: String,
    /// WMO platform number
    pub float_id: String,
    /// Cycle number
    pub cycle_number: Option<i32>,
    /// `A` (ascending) or `D` (descending)
    pub direction: char,
    /// Decoded JULD
    pub timestamp: Option<DateTime<Utc>>,
    /// Degrees north, always within bounds
    pub latitude: f64,
    /// Degrees east, always within bounds
    pub longitude: f64,
    /// `POSITION_QC` flag
    pub position_qc: Option<QcFlag>,
    /// Shallowest depth with kept observations
    pub depth_min: Option<f64>,
    /// Deepest depth with kept observations
    pub depth_max: Option<f64>,
    /// Occupied levels of the profile
    pub n_levels: usize,
    /// Kept observations of the profile
    pub n_observations: usize,
    /// Parameters with at least one value in the profile
    pub parameters: Vec<Parameter>,
    /// Statistics of kept values per parameter
    pub statistics: BTreeMap<Parameter, SummaryStats>,
    /// Whether any biogeochemical parameter has values in the profile
    pub has_biogeochemical: bool,
    /// Profile `DATA_MODE`
    pub data_mode: Option<DataMode>,
}

impl ProfileSummary {
    /// Comma-joined parameter list
    pub fn parameter_list(&self) -> String {
        self.parameters
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Row-per-profile table in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileTable {
    /// Rows
    pub rows: Vec<ProfileSummary>,
}

impl ProfileTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows
    pub fn iter(&self) -> impl Iterator<Item = &ProfileSummary> {
        self.rows.iter()
    }

    /// Row by profile identifier
    pub fn get(&self, profile_id: &str) -> Option<&ProfileSummary> {
        self.rows.iter().find(|row| row.profile_id == profile_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator() {
        let mut acc = StatsAccumulator::default();
        assert!(acc.finish().is_none());
        for v in [3.0, -1.0, 4.0] {
            acc.push(v);
        }
        let stats = acc.finish().unwrap();
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 2.0).abs() < 1e-12);
    }
}
