use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical quantities measured by core and biogeochemical ARGO sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    /// Sea water pressure (dbar)
    #[serde(rename = "PRES")]
    Pres,
    /// Sea temperature in-situ ITS-90 scale (degree_Celsius)
    #[serde(rename = "TEMP")]
    Temp,
    /// Practical salinity (psu)
    #[serde(rename = "PSAL")]
    Psal,
    /// Dissolved oxygen (micromole/kg)
    #[serde(rename = "DOXY")]
    Doxy,
    /// Chlorophyll-A (mg/m3)
    #[serde(rename = "CHLA")]
    Chla,
    /// Particle backscattering at 700 nanometers (m-1)
    #[serde(rename = "BBP700")]
    Bbp700,
    /// pH (total scale)
    #[serde(rename = "PH_IN_SITU_TOTAL")]
    PhInSituTotal,
    /// Nitrate (micromole/kg)
    #[serde(rename = "NITRATE")]
    Nitrate,
    /// Concentration of coloured dissolved organic matter (ppb)
    #[serde(rename = "CDOM")]
    Cdom,
    /// Downwelling photosynthetic available radiation (microMoleQuanta/m^2/sec)
    #[serde(rename = "DOWNWELLING_PAR")]
    DownwellingPar,
}

impl Parameter {
    /// Every parameter the pipeline knows, core first
    pub const ALL: [Parameter; 10] = [
        Parameter::Pres,
        Parameter::Temp,
        Parameter::Psal,
        Parameter::Doxy,
        Parameter::Chla,
        Parameter::Bbp700,
        Parameter::PhInSituTotal,
        Parameter::Nitrate,
        Parameter::Cdom,
        Parameter::DownwellingPar,
    ];

    /// ARGO variable name
    pub fn name(self) -> &'static str {
        match self {
            Parameter::Pres => "PRES",
            Parameter::Temp => "TEMP",
            Parameter::Psal => "PSAL",
            Parameter::Doxy => "DOXY",
            Parameter::Chla => "CHLA",
            Parameter::Bbp700 => "BBP700",
            Parameter::PhInSituTotal => "PH_IN_SITU_TOTAL",
            Parameter::Nitrate => "NITRATE",
            Parameter::Cdom => "CDOM",
            Parameter::DownwellingPar => "DOWNWELLING_PAR",
        }
    }

    /// Resolve an ARGO variable name (case-sensitive, as written in files)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Lower-case prefix used for profile summary statistic columns
    pub fn column_prefix(self) -> String {
        self.name().to_ascii_lowercase()
    }

    /// Canonical units
    pub fn units(self) -> &'static str {
        match self {
            Parameter::Pres => "decibar",
            Parameter::Temp => "degree_Celsius",
            Parameter::Psal => "psu",
            Parameter::Doxy | Parameter::Nitrate => "micromole/kg",
            Parameter::Chla => "mg/m3",
            Parameter::Bbp700 => "m-1",
            Parameter::PhInSituTotal => "dimensionless",
            Parameter::Cdom => "ppb",
            Parameter::DownwellingPar => "microMoleQuanta/m^2/sec",
        }
    }

    /// Pressure, temperature and salinity
    pub fn is_core(self) -> bool {
        matches!(self, Parameter::Pres | Parameter::Temp | Parameter::Psal)
    }

    /// Non-core sensor measurement
    pub fn is_biogeochemical(self) -> bool {
        !self.is_core()
    }

    /// Name of the calibration-corrected counterpart
    pub fn adjusted_name(self) -> String {
        format!("{}_ADJUSTED", self.name())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
