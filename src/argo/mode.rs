use std::fmt;

use serde::{Deserialize, Serialize};

/// Calibration maturity of a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataMode {
    /// 'R' - uncalibrated, distributed within hours
    #[serde(rename = "real-time")]
    RealTime,
    /// 'A' - real-time data with automatic adjustments
    #[serde(rename = "adjusted")]
    Adjusted,
    /// 'D' - expert-calibrated delayed-mode data
    #[serde(rename = "delayed")]
    Delayed,
}

impl DataMode {
    /// Parse the single-character encoding used in files and file names
    pub fn from_char(c: u8) -> Option<Self> {
        match c.to_ascii_uppercase() {
            b'R' => Some(DataMode::RealTime),
            b'A' => Some(DataMode::Adjusted),
            b'D' => Some(DataMode::Delayed),
            _ => None,
        }
    }

    /// Single-character encoding
    pub fn as_char(self) -> char {
        match self {
            DataMode::RealTime => 'R',
            DataMode::Adjusted => 'A',
            DataMode::Delayed => 'D',
        }
    }

    /// Label written to output tables
    pub fn label(self) -> &'static str {
        match self {
            DataMode::RealTime => "real-time",
            DataMode::Adjusted => "adjusted",
            DataMode::Delayed => "delayed",
        }
    }

    /// Parse a label written by [`DataMode::label`]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "real-time" => Some(DataMode::RealTime),
            "adjusted" => Some(DataMode::Adjusted),
            "delayed" => Some(DataMode::Delayed),
            _ => None,
        }
    }

    /// Whether the adjusted variable is authoritative in this mode
    pub fn prefers_adjusted(self) -> bool {
        !matches!(self, DataMode::RealTime)
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of ARGO file, deciding where data-mode declarations live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Core profile file: PRES/TEMP/PSAL, one DATA_MODE per profile
    Core,
    /// B-file: biogeochemical parameters with PARAMETER_DATA_MODE
    Biogeochemical,
    /// S-file: merged core + BGC parameters with PARAMETER_DATA_MODE
    Synthetic,
    /// Trajectory file (not profile-oriented)
    Trajectory,
}

impl FileCategory {
    /// Whether data modes are declared per parameter
    pub fn has_parameter_modes(self) -> bool {
        matches!(self, FileCategory::Biogeochemical | FileCategory::Synthetic)
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileCategory::Core => "core",
            FileCategory::Biogeochemical => "biogeochemical",
            FileCategory::Synthetic => "synthetic",
            FileCategory::Trajectory => "trajectory",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_chars() {
        assert_eq!(DataMode::from_char(b'R'), Some(DataMode::RealTime));
        assert_eq!(DataMode::from_char(b'd'), Some(DataMode::Delayed));
        assert_eq!(DataMode::from_char(b' '), None);
        assert_eq!(DataMode::Adjusted.as_char(), 'A');
        assert!(DataMode::Delayed.prefers_adjusted());
        assert!(!DataMode::RealTime.prefers_adjusted());
    }

    #[test]
    fn test_mode_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&DataMode::RealTime).unwrap(),
            "\"real-time\""
        );
        assert_eq!(
            serde_json::to_string(&FileCategory::Biogeochemical).unwrap(),
            "\"biogeochemical\""
        );
    }
}
