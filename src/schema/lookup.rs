use serde::Serialize;

use crate::argo::DataMode;

/// Names of the variables backing one variant of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableHandle {
    /// Value variable (`TEMP` or `TEMP_ADJUSTED`)
    pub value: String,
    /// Paired QC variable, when present
    pub qc: Option<String>,
    /// Adjusted-error variable, adjusted variant only
    pub error: Option<String>,
}

/// Raw and adjusted variants of a parameter found in a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterVariants {
    /// Raw variable
    pub raw: Option<VariableHandle>,
    /// Calibration-corrected variable
    pub adjusted: Option<VariableHandle>,
}

/// Where the authoritative values of a parameter come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSource<'a> {
    /// No usable variable
    Absent,
    /// The raw variable
    Raw(&'a VariableHandle),
    /// The adjusted variable
    Adjusted(&'a VariableHandle),
}

impl VariableSource<'_> {
    /// Handle of the selected variable
    pub fn handle(&self) -> Option<&VariableHandle> {
        match self {
            VariableSource::Absent => None,
            VariableSource::Raw(handle) | VariableSource::Adjusted(handle) => Some(handle),
        }
    }

    /// Whether the adjusted variable was selected
    pub fn is_adjusted(&self) -> bool {
        matches!(self, VariableSource::Adjusted(_))
    }
}

/// Outcome of the raw/adjusted decision for one data mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    /// Chosen variable
    pub source: VariableSource<'a>,
    /// The mode asked for adjusted values but only the raw variable exists
    pub fell_back: bool,
}

impl ParameterVariants {
    /// Whether neither variant exists
    pub fn is_empty(&self) -> bool {
        self.raw.is_none() && self.adjusted.is_none()
    }

    /// Apply the data-mode rule.
    ///
    /// Real-time data always comes from the raw variable. Adjusted and
    /// delayed data come from the adjusted variable, falling back to the raw
    /// one when the file lacks it.
    pub fn select(&self, mode: DataMode) -> Selection<'_> {
        if !mode.prefers_adjusted() {
            return Selection {
                source: self.raw.as_ref().map_or(VariableSource::Absent, VariableSource::Raw),
                fell_back: false,
            };
        }
        match (&self.adjusted, &self.raw) {
            (Some(adjusted), _) => Selection {
                source: VariableSource::Adjusted(adjusted),
                fell_back: false,
            },
            (None, Some(raw)) => Selection {
                source: VariableSource::Raw(raw),
                fell_back: true,
            },
            (None, None) => Selection {
                source: VariableSource::Absent,
                fell_back: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str) -> VariableHandle {
        VariableHandle {
            value: name.to_string(),
            qc: Some(format!("{name}_QC")),
            error: None,
        }
    }

    fn both() -> ParameterVariants {
        ParameterVariants {
            raw: Some(handle("TEMP")),
            adjusted: Some(handle("TEMP_ADJUSTED")),
        }
    }

    #[test]
    fn test_real_time_uses_raw() {
        let variants = both();
        let selection = variants.select(DataMode::RealTime);
        assert_eq!(selection.source.handle().unwrap().value, "TEMP");
        assert!(!selection.fell_back);

        let adjusted_only = ParameterVariants {
            raw: None,
            adjusted: Some(handle("TEMP_ADJUSTED")),
        };
        assert_eq!(adjusted_only.select(DataMode::RealTime).source, VariableSource::Absent);
    }

    #[test]
    fn test_adjusted_and_delayed_use_adjusted() {
        let variants = both();
        for mode in [DataMode::Adjusted, DataMode::Delayed] {
            let selection = variants.select(mode);
            assert!(selection.source.is_adjusted());
            assert_eq!(selection.source.handle().unwrap().value, "TEMP_ADJUSTED");
        }
    }

    #[test]
    fn test_fallback_to_raw() {
        let raw_only = ParameterVariants {
            raw: Some(handle("TEMP")),
            adjusted: None,
        };
        let selection = raw_only.select(DataMode::Delayed);
        assert_eq!(selection.source.handle().unwrap().value, "TEMP");
        assert!(selection.fell_back);
        assert!(ParameterVariants::default().is_empty());
    }
}
