//! Pipeline configuration.
//!
//! Every stage receives its settings through [`PipelineConfig`] at
//! construction time. Defaults reproduce the ARGO real-time QC bounds; tests
//! and callers override individual fields without touching shared state.

use serde::{Deserialize, Serialize};

use crate::argo::{DepthMethod, Parameter, QcFlag};
use crate::export::ExportConfig;

/// Errors raised by [`PipelineConfig::validate`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A range whose minimum exceeds its maximum
    #[error("Invalid range for {name}: min {min} > max {max}")]
    InvalidRange {
        /// Range name
        name: &'static str,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// A QC flag outside 0-9
    #[error("Invalid QC flag {0} (flags are single digits)")]
    InvalidFlag(u8),

    /// Zero workers requested
    #[error("Worker count must be at least 1")]
    NoWorkers,
}

/// Inclusive numeric interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl ValueRange {
    /// Create a new range
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies inside the range
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Bounds and vocabulary used by the validator and by QC filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationBounds {
    /// Latitude (degrees north)
    pub latitude: ValueRange,
    /// Longitude (degrees east)
    pub longitude: ValueRange,
    /// Sea pressure (dbar)
    pub pressure: ValueRange,
    /// In-situ temperature (degree Celsius)
    pub temperature: ValueRange,
    /// Practical salinity (psu)
    pub salinity: ValueRange,
    /// QC flag values allowed to appear in files
    pub qc_vocabulary: Vec<u8>,
    /// Treat out-of-bounds positions as a file rejection rather than a soft failure
    pub reject_invalid_position: bool,
}

impl Default for ValidationBounds {
    fn default() -> Self {
        Self {
            latitude: ValueRange::new(-90.0, 90.0),
            longitude: ValueRange::new(-180.0, 180.0),
            pressure: ValueRange::new(0.0, 6000.0),
            temperature: ValueRange::new(-5.0, 50.0),
            salinity: ValueRange::new(0.0, 50.0),
            qc_vocabulary: vec![0, 1, 2, 3, 4, 5, 8, 9],
            reject_invalid_position: true,
        }
    }
}

impl ValidationBounds {
    /// Physical range for a parameter, when one is configured
    pub fn range_for(&self, parameter: Parameter) -> Option<ValueRange> {
        match parameter {
            Parameter::Pres => Some(self.pressure),
            Parameter::Temp => Some(self.temperature),
            Parameter::Psal => Some(self.salinity),
            _ => None,
        }
    }

    /// Whether a flag belongs to the configured vocabulary
    pub fn flag_in_vocabulary(&self, flag: QcFlag) -> bool {
        self.qc_vocabulary.contains(&flag.value())
    }
}

/// Which observations survive QC filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcPolicy {
    /// Flags whose observations are kept
    pub accepted_flags: Vec<u8>,
    /// Drop values outside the configured physical bounds
    pub drop_out_of_range: bool,
}

impl Default for QcPolicy {
    fn default() -> Self {
        Self::preferred()
    }
}

impl QcPolicy {
    /// Good and probably-good data only
    pub fn preferred() -> Self {
        Self {
            accepted_flags: vec![1, 2],
            drop_out_of_range: true,
        }
    }

    /// Everything except bad (4), missing (9) and reserved flags
    pub fn relaxed() -> Self {
        Self {
            accepted_flags: vec![0, 1, 2, 3, 5, 8],
            drop_out_of_range: true,
        }
    }

    /// Whether an observation carrying `flag` is kept
    pub fn accepts(&self, flag: QcFlag) -> bool {
        !flag.is_reserved() && self.accepted_flags.contains(&flag.value())
    }

    /// Short name for reports
    pub fn label(&self) -> String {
        if *self == Self::preferred() {
            "preferred".to_string()
        } else if *self == Self::relaxed() {
            "relaxed".to_string()
        } else {
            let flags: Vec<String> = self.accepted_flags.iter().map(|f| f.to_string()).collect();
            format!("custom[{}]", flags.join(","))
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Validator bounds and flag vocabulary
    pub validation: ValidationBounds,
    /// QC filtering policy
    pub qc: QcPolicy,
    /// Depth derivation strategy
    pub depth_method: DepthMethod,
    /// Columnar output settings
    pub export: ExportConfig,
    /// Number of files processed concurrently
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationBounds::default(),
            qc: QcPolicy::default(),
            depth_method: DepthMethod::default(),
            export: ExportConfig::default(),
            workers: 4,
        }
    }
}

impl PipelineConfig {
    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("latitude", self.validation.latitude),
            ("longitude", self.validation.longitude),
            ("pressure", self.validation.pressure),
            ("temperature", self.validation.temperature),
            ("salinity", self.validation.salinity),
        ];
        for (name, range) in ranges {
            if range.min > range.max {
                return Err(ConfigError::InvalidRange {
                    name,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        let flags = self
            .validation
            .qc_vocabulary
            .iter()
            .chain(self.qc.accepted_flags.iter());
        for flag in flags {
            if *flag > 9 {
                return Err(ConfigError::InvalidFlag(*flag));
            }
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let bounds = ValidationBounds::default();
        assert!(bounds.latitude.contains(-90.0));
        assert!(!bounds.latitude.contains(95.0));
        assert!(!bounds.longitude.contains(200.0));
        assert!(bounds.pressure.contains(6000.0));
        assert_eq!(bounds.range_for(Parameter::Temp), Some(ValueRange::new(-5.0, 50.0)));
        assert_eq!(bounds.range_for(Parameter::Doxy), None);
        assert!(!bounds.flag_in_vocabulary(QcFlag::new(6).unwrap()));
    }

    #[test]
    fn test_policies() {
        let preferred = QcPolicy::preferred();
        assert!(preferred.accepts(QcFlag::GOOD));
        assert!(preferred.accepts(QcFlag::PROBABLY_GOOD));
        assert!(!preferred.accepts(QcFlag::PROBABLY_BAD));
        assert!(!preferred.accepts(QcFlag::MISSING));

        let relaxed = QcPolicy::relaxed();
        assert!(relaxed.accepts(QcFlag::PROBABLY_BAD));
        assert!(!relaxed.accepts(QcFlag::BAD));
        assert_eq!(relaxed.label(), "relaxed");
    }

    #[test]
    fn test_validate_config() {
        assert!(PipelineConfig::default().validate().is_ok());

        let mut config = PipelineConfig::default();
        config.validation.temperature = ValueRange::new(10.0, 0.0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange { .. })));

        let mut config = PipelineConfig::default();
        config.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));
    }

    #[test]
    fn test_partial_deserialization() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"workers": 2, "qc": {"accepted_flags": [1]}}"#).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.qc.accepted_flags, vec![1]);
        assert!(config.qc.drop_out_of_range);
        assert_eq!(config.validation, ValidationBounds::default());
    }
}
