//! Synthetic ARGO profile files.
//!
//! Builds small but structurally faithful core, B and S profile files with the
//! in-crate NetCDF writer. Used by the `demo` command, tests and benchmarks.
//!
//! ```
//! use argo_dataops::argo::{DataMode, FileCategory, Parameter};
//! use argo_dataops::synthetic::{SyntheticFile, SyntheticProfile, SyntheticSeries};
//!
//! let profile = SyntheticProfile::new(1, 25353.75, 12.5, -30.0, DataMode::Delayed)
//!     .with(Parameter::Pres, SyntheticSeries::raw(&[10.0], "1").with_adjusted(&[10.0], "1"))
//!     .with(Parameter::Temp, SyntheticSeries::raw(&[15.0], "1").with_adjusted(&[14.8], "1"));
//! let bytes = SyntheticFile::new(FileCategory::Core, "1900722")
//!     .with_profile(profile)
//!     .to_bytes()
//!     .unwrap();
//! assert_eq!(&bytes[..4], b"CDF\x01");
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use crate::argo::{dimensions, variables, DataMode, FileCategory, Parameter, ARGO_FLOAT_FILL};
use crate::netcdf::{NcError, NcValues, NcWriter};

const JULD_FILL: f64 = 999_999.0;
const STRING_LEN: usize = 16;

/// Values of one parameter along the levels of a profile.
///
/// Values equal to `99999` are fill; QC strings hold one character per level
/// and are padded with blanks.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSeries {
    /// Raw values
    pub raw: Vec<f64>,
    /// Raw QC characters
    pub raw_qc: String,
    /// Adjusted values and QC characters
    pub adjusted: Option<(Vec<f64>, String)>,
    /// Adjusted error estimates
    pub adjusted_error: Option<Vec<f64>>,
    /// Per-parameter data mode (B and S files)
    pub mode: Option<DataMode>,
}

impl SyntheticSeries {
    /// Raw values with their QC flags
    pub fn raw(values: &[f64], qc: &str) -> Self {
        Self {
            raw: values.to_vec(),
            raw_qc: qc.to_string(),
            adjusted: None,
            adjusted_error: None,
            mode: None,
        }
    }

    /// Add the adjusted variant
    pub fn with_adjusted(mut self, values: &[f64], qc: &str) -> Self {
        self.adjusted = Some((values.to_vec(), qc.to_string()));
        self
    }

    /// Add adjusted error estimates
    pub fn with_error(mut self, errors: &[f64]) -> Self {
        self.adjusted_error = Some(errors.to_vec());
        self
    }

    /// Declare a per-parameter data mode
    pub fn with_mode(mut self, mode: DataMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// One profile (station) of a synthetic file
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticProfile {
    /// Cycle number
    pub cycle: i32,
    /// JULD day offset; `None` writes the fill value
    pub juld: Option<f64>,
    /// Latitude; `None` writes the fill value
    pub latitude: Option<f64>,
    /// Longitude; `None` writes the fill value
    pub longitude: Option<f64>,
    /// Position QC character
    pub position_qc: u8,
    /// `A` or `D`
    pub direction: u8,
    /// Profile `DATA_MODE`
    pub data_mode: DataMode,
    /// Measured parameters
    pub parameters: Vec<(Parameter, SyntheticSeries)>,
}

impl SyntheticProfile {
    /// An ascending profile with good position
    pub fn new(cycle: i32, juld: f64, latitude: f64, longitude: f64, data_mode: DataMode) -> Self {
        Self {
            cycle,
            juld: Some(juld),
            latitude: Some(latitude),
            longitude: Some(longitude),
            position_qc: b'1',
            direction: b'A',
            data_mode,
            parameters: Vec::new(),
        }
    }

    /// Add or replace a parameter
    pub fn with(mut self, parameter: Parameter, series: SyntheticSeries) -> Self {
        self.parameters.retain(|(p, _)| *p != parameter);
        self.parameters.push((parameter, series));
        self
    }

    /// Mark the profile as descending
    pub fn descending(mut self) -> Self {
        self.direction = b'D';
        self
    }

    fn series(&self, parameter: Parameter) -> Option<&SyntheticSeries> {
        self.parameters
            .iter()
            .find(|(p, _)| *p == parameter)
            .map(|(_, s)| s)
    }
}

/// Builder for a complete profile file
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticFile {
    category: FileCategory,
    platform_number: String,
    profiles: Vec<SyntheticProfile>,
    omitted: BTreeSet<String>,
}

impl SyntheticFile {
    /// Empty file of the given category
    pub fn new(category: FileCategory, platform_number: impl Into<String>) -> Self {
        Self {
            category,
            platform_number: platform_number.into(),
            profiles: Vec::new(),
            omitted: BTreeSet::new(),
        }
    }

    /// Append a profile
    pub fn with_profile(mut self, profile: SyntheticProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Leave a variable out of the file
    pub fn without_variable(mut self, name: &str) -> Self {
        self.omitted.insert(name.to_string());
        self
    }

    /// Build a NetCDF image
    pub fn to_bytes(&self) -> Result<Vec<u8>, NcError> {
        self.to_writer()?.to_bytes()
    }

    /// Write to disk, returning the number of bytes written
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<u64, NcError> {
        self.to_writer()?.write_to_path(path)
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut params: Vec<Parameter> = self
            .profiles
            .iter()
            .flat_map(|p| p.parameters.iter().map(|(param, _)| *param))
            .collect();
        params.sort();
        params.dedup();
        params
    }

    fn n_levels(&self) -> usize {
        self.profiles
            .iter()
            .flat_map(|p| p.parameters.iter())
            .map(|(_, s)| s.raw.len())
            .max()
            .unwrap_or(0)
            .max(1)
    }

    fn to_writer(&self) -> Result<NcWriter, NcError> {
        let n_prof = self.profiles.len().max(1);
        let n_levels = self.n_levels();
        let params = self.parameters();
        let n_param = params.len().max(1);
        let prof_levels = [dimensions::N_PROF, dimensions::N_LEVELS];

        let mut w = NcWriter::new();
        w.add_dimension(dimensions::N_PROF, n_prof)?
            .add_dimension(dimensions::N_LEVELS, n_levels)?
            .add_dimension(dimensions::N_PARAM, n_param)?
            .add_dimension("STRING8", 8)?
            .add_dimension("STRING4", 4)?
            .add_dimension("STRING16", STRING_LEN)?
            .add_dimension("STRING32", 32)?;
        w.add_global_attribute("title", NcValues::text("Argo float vertical profile"))
            .add_global_attribute("institution", NcValues::text("SYNTHETIC"))
            .add_global_attribute("Conventions", NcValues::text("Argo-3.1 CF-1.6"))
            .add_global_attribute("featureType", NcValues::text("trajectoryProfile"));

        let data_type = match self.category {
            FileCategory::Core => "Argo profile",
            FileCategory::Biogeochemical => "B-Argo profile",
            FileCategory::Synthetic => "Argo synthetic profile",
            FileCategory::Trajectory => "Argo trajectory",
        };
        self.add(&mut w, variables::DATA_TYPE, &["STRING32"], NcValues::text(&pad(data_type, 32)))?;
        self.add(&mut w, variables::FORMAT_VERSION, &["STRING4"], NcValues::text("3.1 "))?;

        let platform: String = (0..n_prof).map(|_| pad(&self.platform_number, 8)).collect();
        self.add(&mut w, variables::PLATFORM_NUMBER, &[dimensions::N_PROF, "STRING8"], NcValues::text(&platform))?;

        let profile_chars = |f: &dyn Fn(&SyntheticProfile) -> u8| -> NcValues {
            let mut bytes: Vec<u8> = self.profiles.iter().map(f).collect();
            bytes.resize(n_prof, b' ');
            NcValues::Chars(bytes)
        };
        let profile_doubles = |f: &dyn Fn(&SyntheticProfile) -> f64, fill: f64| -> NcValues {
            let mut values: Vec<f64> = self.profiles.iter().map(f).collect();
            values.resize(n_prof, fill);
            NcValues::Doubles(values)
        };

        let mut cycles: Vec<i32> = self.profiles.iter().map(|p| p.cycle).collect();
        cycles.resize(n_prof, 99999);
        self.add(&mut w, variables::CYCLE_NUMBER, &[dimensions::N_PROF], NcValues::Ints(cycles))?;
        self.attr(&mut w, variables::CYCLE_NUMBER, "_FillValue", NcValues::Ints(vec![99999]))?;

        self.add(&mut w, variables::DIRECTION, &[dimensions::N_PROF], profile_chars(&|p| p.direction))?;
        self.add(&mut w, variables::DATA_MODE, &[dimensions::N_PROF], profile_chars(&|p| p.data_mode.as_char() as u8))?;

        self.add(
            &mut w,
            variables::JULD,
            &[dimensions::N_PROF],
            profile_doubles(&|p| p.juld.unwrap_or(JULD_FILL), JULD_FILL),
        )?;
        self.attr(&mut w, variables::JULD, "units", NcValues::text("days since 1950-01-01 00:00:00 UTC"))?;
        self.attr(&mut w, variables::JULD, "_FillValue", NcValues::Doubles(vec![JULD_FILL]))?;
        self.add(&mut w, variables::JULD_QC, &[dimensions::N_PROF], profile_chars(&|_| b'1'))?;

        let latitudes = profile_doubles(&|p| p.latitude.unwrap_or(ARGO_FLOAT_FILL), ARGO_FLOAT_FILL);
        let longitudes = profile_doubles(&|p| p.longitude.unwrap_or(ARGO_FLOAT_FILL), ARGO_FLOAT_FILL);
        for (name, units, values) in [
            (variables::LATITUDE, "degree_north", latitudes),
            (variables::LONGITUDE, "degree_east", longitudes),
        ] {
            self.add(&mut w, name, &[dimensions::N_PROF], values)?;
            self.attr(&mut w, name, "units", NcValues::text(units))?;
            self.attr(&mut w, name, "_FillValue", NcValues::Doubles(vec![ARGO_FLOAT_FILL]))?;
        }
        self.add(&mut w, variables::POSITION_QC, &[dimensions::N_PROF], profile_chars(&|p| p.position_qc))?;

        if self.category.has_parameter_modes() {
            let mut stations = String::new();
            let mut modes = Vec::with_capacity(n_prof * n_param);
            for prof in 0..n_prof {
                let profile = self.profiles.get(prof);
                for column in 0..n_param {
                    let param = params.get(column);
                    stations.push_str(&pad(param.map_or("", |p| p.name()), STRING_LEN));
                    let mode = match (profile, param) {
                        (Some(profile), Some(param)) => profile
                            .series(*param)
                            .map(|s| s.mode.unwrap_or(profile.data_mode).as_char() as u8)
                            .unwrap_or(b' '),
                        _ => b' ',
                    };
                    modes.push(mode);
                }
            }
            self.add(
                &mut w,
                variables::STATION_PARAMETERS,
                &[dimensions::N_PROF, dimensions::N_PARAM, "STRING16"],
                NcValues::text(&stations),
            )?;
            self.add(
                &mut w,
                variables::PARAMETER_DATA_MODE,
                &[dimensions::N_PROF, dimensions::N_PARAM],
                NcValues::Chars(modes),
            )?;
        }

        for param in &params {
            let grid = |pick: &dyn Fn(&SyntheticSeries) -> Option<Vec<f64>>| -> Option<Vec<f32>> {
                let mut any = false;
                let mut values = Vec::with_capacity(n_prof * n_levels);
                for prof in 0..n_prof {
                    let series = self.profiles.get(prof).and_then(|p| p.series(*param));
                    let row = series.and_then(pick);
                    any |= row.is_some();
                    let row = row.unwrap_or_default();
                    values.extend((0..n_levels).map(|l| row.get(l).copied().unwrap_or(ARGO_FLOAT_FILL) as f32));
                }
                any.then_some(values)
            };
            let flags = |pick: &dyn Fn(&SyntheticSeries) -> Option<String>| -> Vec<u8> {
                let mut bytes = Vec::with_capacity(n_prof * n_levels);
                for prof in 0..n_prof {
                    let row = self
                        .profiles
                        .get(prof)
                        .and_then(|p| p.series(*param))
                        .and_then(pick)
                        .unwrap_or_default();
                    bytes.extend(pad(&row, n_levels).bytes().take(n_levels));
                }
                bytes
            };

            let name = param.name();
            if let Some(raw) = grid(&|s| Some(s.raw.clone())) {
                self.measurement(&mut w, name, param.units(), raw)?;
                self.add(&mut w, &format!("{name}_QC"), &prof_levels, NcValues::Chars(flags(&|s| Some(s.raw_qc.clone()))))?;
            }
            let adjusted_name = param.adjusted_name();
            if let Some(adjusted) = grid(&|s| s.adjusted.as_ref().map(|(v, _)| v.clone())) {
                self.measurement(&mut w, &adjusted_name, param.units(), adjusted)?;
                self.add(
                    &mut w,
                    &format!("{adjusted_name}_QC"),
                    &prof_levels,
                    NcValues::Chars(flags(&|s| s.adjusted.as_ref().map(|(_, q)| q.clone()))),
                )?;
            }
            if let Some(errors) = grid(&|s| s.adjusted_error.clone()) {
                self.measurement(&mut w, &format!("{adjusted_name}_ERROR"), param.units(), errors)?;
            }
        }

        Ok(w)
    }

    fn add(&self, w: &mut NcWriter, name: &str, dims: &[&str], values: NcValues) -> Result<(), NcError> {
        if !self.omitted.contains(name) {
            w.add_variable(name, dims, values)?;
        }
        Ok(())
    }

    fn attr(&self, w: &mut NcWriter, var: &str, name: &str, value: NcValues) -> Result<(), NcError> {
        if !self.omitted.contains(var) {
            w.add_variable_attribute(var, name, value)?;
        }
        Ok(())
    }

    fn measurement(&self, w: &mut NcWriter, name: &str, units: &str, values: Vec<f32>) -> Result<(), NcError> {
        self.add(w, name, &[dimensions::N_PROF, dimensions::N_LEVELS], NcValues::Floats(values))?;
        self.attr(w, name, "units", NcValues::text(units))?;
        self.attr(w, name, "_FillValue", NcValues::Floats(vec![ARGO_FLOAT_FILL as f32]))
    }

    /// Realistic multi-profile file for demonstrations and benchmarks.
    ///
    /// Profiles follow a float drifting north-east from 20N 40W, ten days
    /// apart, with a thermocline near 150 dbar.
    pub fn demo(category: FileCategory, n_profiles: usize, n_levels: usize) -> Self {
        let mut file = Self::new(category, "1900722");
        for prof in 0..n_profiles {
            let cycle = prof as i32 + 1;
            let mode = match prof % 3 {
                0 => DataMode::Delayed,
                1 => DataMode::Adjusted,
                _ => DataMode::RealTime,
            };
            let juld = 25_000.0 + 10.0 * prof as f64 + 0.25;
            let latitude = 20.0 + 0.1 * prof as f64;
            let longitude = -40.0 + 0.15 * prof as f64;

            let pres: Vec<f64> = (0..n_levels).map(|l| 5.0 + 10.0 * l as f64).collect();
            let temp: Vec<f64> = pres
                .iter()
                .map(|p| 4.0 + 22.0 / (1.0 + (p / 150.0).powi(2)))
                .collect();
            let psal: Vec<f64> = pres.iter().map(|p| 34.6 + 0.8 * (-p / 400.0).exp()).collect();
            let qc: String = (0..n_levels)
                .map(|l| match l % 17 {
                    16 => '4',
                    11 => '3',
                    _ => '1',
                })
                .collect();

            let with_adjusted = |values: &[f64], offset: f64| {
                let series = SyntheticSeries::raw(values, &qc);
                if mode.prefers_adjusted() {
                    let adjusted: Vec<f64> = values.iter().map(|v| v + offset).collect();
                    series
                        .with_adjusted(&adjusted, &qc)
                        .with_error(&vec![offset.abs().max(0.002); values.len()])
                } else {
                    series
                }
            };

            let mut profile = SyntheticProfile::new(cycle, juld, latitude, longitude, mode)
                .with(Parameter::Pres, with_adjusted(&pres, 0.0))
                .with(Parameter::Temp, with_adjusted(&temp, -0.002))
                .with(Parameter::Psal, with_adjusted(&psal, 0.01));

            if category.has_parameter_modes() {
                let doxy: Vec<f64> = pres.iter().map(|p| 180.0 + 60.0 * (-p / 300.0).exp()).collect();
                let chla: Vec<f64> = pres
                    .iter()
                    .map(|p| 0.05 + 0.6 * (-((p - 80.0) / 40.0).powi(2)).exp())
                    .collect();
                profile = profile
                    .with(
                        Parameter::Doxy,
                        SyntheticSeries::raw(&doxy, &qc)
                            .with_adjusted(&doxy.iter().map(|v| v * 1.05).collect::<Vec<_>>(), &qc)
                            .with_mode(DataMode::Adjusted),
                    )
                    .with(Parameter::Chla, SyntheticSeries::raw(&chla, &qc).with_mode(DataMode::RealTime));
            }
            file = file.with_profile(profile);
        }
        file
    }
}

fn pad(text: &str, width: usize) -> String {
    let mut padded: String = text.chars().take(width).collect();
    while padded.len() < width {
        padded.push(' ');
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netcdf::NcFile;

    #[test]
    fn test_core_file_layout() {
        let profile = SyntheticProfile::new(7, 25000.5, 10.0, 20.0, DataMode::RealTime)
            .with(Parameter::Pres, SyntheticSeries::raw(&[5.0, 10.0], "11"))
            .with(Parameter::Temp, SyntheticSeries::raw(&[20.0, 19.0], "14"));
        let bytes = SyntheticFile::new(FileCategory::Core, "5904859")
            .with_profile(profile)
            .to_bytes()
            .unwrap();
        let nc = NcFile::from_bytes(bytes).unwrap();

        assert_eq!(nc.dimension("N_LEVELS").unwrap().length, 2);
        assert!(nc.has_variable("TEMP_QC"));
        assert!(!nc.has_variable("TEMP_ADJUSTED"));
        assert!(!nc.has_variable("PARAMETER_DATA_MODE"));
        let temp = nc.read_numeric("TEMP").unwrap();
        assert_eq!(temp.get2(0, 1), Some(19.0));
        assert_eq!(nc.read_chars("TEMP_QC").unwrap().char2(0, 1), Some(b'4'));
    }

    #[test]
    fn test_bgc_parameter_modes() {
        let bytes = SyntheticFile::demo(FileCategory::Biogeochemical, 2, 4).to_bytes().unwrap();
        let nc = NcFile::from_bytes(bytes).unwrap();
        let modes = nc.read_chars("PARAMETER_DATA_MODE").unwrap();
        // PRES TEMP PSAL DOXY CHLA, profile 0 is delayed
        assert_eq!(modes.shape, vec![2, 5]);
        assert_eq!(modes.char2(0, 0), Some(b'D'));
        assert_eq!(modes.char2(0, 3), Some(b'A'));
        assert_eq!(modes.char2(0, 4), Some(b'R'));
    }

    #[test]
    fn test_omitted_variable() {
        let bytes = SyntheticFile::demo(FileCategory::Core, 1, 3)
            .without_variable("LATITUDE")
            .to_bytes()
            .unwrap();
        let nc = NcFile::from_bytes(bytes).unwrap();
        assert!(!nc.has_variable("LATITUDE"));
        assert!(nc.has_variable("LONGITUDE"));
    }
}
