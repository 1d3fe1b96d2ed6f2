//! ARGO file naming conventions.
//!
//! Single-profile files are named `<prefix><float>_<cycle>[D].nc`, where the
//! prefix is `R`/`D` (core), `BR`/`BD` (biogeochemical) or `SR`/`SD`
//! (synthetic). Multi-profile and trajectory files use
//! `<float>_{prof,Bprof,Sprof}.nc` and `<float>_{Rtraj,Dtraj,BRtraj,...}.nc`.
//! Names are only hints: the file content is authoritative.

use serde::Serialize;

use crate::argo::{DataMode, FileCategory};

/// What a file name claims about its content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilenameHint {
    /// File category implied by the prefix or suffix
    pub category: Option<FileCategory>,
    /// Data mode implied by the `R`/`D` letter
    pub data_mode: Option<DataMode>,
    /// WMO float identifier
    pub float_id: Option<String>,
    /// Cycle number of a single-profile file
    pub cycle_number: Option<u32>,
    /// Descending profile (`_001D`)
    pub descending: bool,
    /// Multi-profile aggregate file
    pub multi_profile: bool,
}

/// Parse a file name, `None` when it follows no known convention
pub fn parse_filename(file_name: &str) -> Option<FilenameHint> {
    let stem = file_name
        .strip_suffix(".nc")
        .or_else(|| file_name.strip_suffix(".NC"))
        .unwrap_or(file_name);
    let (head, tail) = stem.split_once('_')?;

    if let Some(mode_prefix) = tail.strip_suffix("traj") {
        let (_, mode) = split_prefix(mode_prefix)?;
        return Some(FilenameHint {
            category: Some(FileCategory::Trajectory),
            data_mode: mode,
            float_id: digits(head),
            ..FilenameHint::default()
        });
    }

    if let Some(category_prefix) = tail.strip_suffix("prof") {
        let category = match category_prefix {
            "" => FileCategory::Core,
            "B" => FileCategory::Biogeochemical,
            "S" => FileCategory::Synthetic,
            _ => return None,
        };
        return Some(FilenameHint {
            category: Some(category),
            float_id: digits(head),
            multi_profile: true,
            ..FilenameHint::default()
        });
    }

    let split = head.find(|c: char| c.is_ascii_digit())?;
    let (prefix, float) = head.split_at(split);
    let (category, mode) = split_prefix(prefix)?;
    let mode = mode?;
    let float_id = digits(float)?;

    let (cycle, descending) = match tail.strip_suffix('D') {
        Some(cycle) => (cycle, true),
        None => (tail, false),
    };
    let cycle_number = cycle.parse::<u32>().ok()?;

    Some(FilenameHint {
        category: Some(category),
        data_mode: Some(mode),
        float_id: Some(float_id),
        cycle_number: Some(cycle_number),
        descending,
        multi_profile: false,
    })
}

fn split_prefix(prefix: &str) -> Option<(FileCategory, Option<DataMode>)> {
    let (category, mode) = match prefix.as_bytes() {
        [] => (FileCategory::Core, None),
        [m] => (FileCategory::Core, Some(*m)),
        [b'B', m] => (FileCategory::Biogeochemical, Some(*m)),
        [b'S', m] => (FileCategory::Synthetic, Some(*m)),
        _ => return None,
    };
    match mode {
        Some(c @ (b'R' | b'D')) => Some((category, DataMode::from_char(c))),
        Some(_) => None,
        None => Some((category, None)),
    }
}

fn digits(s: &str) -> Option<String> {
    (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_profile_names() {
        let hint = parse_filename("D1900722_001D.nc").unwrap();
        assert_eq!(hint.category, Some(FileCategory::Core));
        assert_eq!(hint.data_mode, Some(DataMode::Delayed));
        assert_eq!(hint.float_id.as_deref(), Some("1900722"));
        assert_eq!(hint.cycle_number, Some(1));
        assert!(hint.descending);

        let hint = parse_filename("BR5904859_123.nc").unwrap();
        assert_eq!(hint.category, Some(FileCategory::Biogeochemical));
        assert_eq!(hint.data_mode, Some(DataMode::RealTime));
        assert_eq!(hint.cycle_number, Some(123));
        assert!(!hint.descending);

        let hint = parse_filename("SD6901234_045.nc").unwrap();
        assert_eq!(hint.category, Some(FileCategory::Synthetic));
    }

    #[test]
    fn test_aggregate_names() {
        let hint = parse_filename("6901234_prof.nc").unwrap();
        assert!(hint.multi_profile);
        assert_eq!(hint.category, Some(FileCategory::Core));
        assert_eq!(parse_filename("6901234_Sprof.nc").unwrap().category, Some(FileCategory::Synthetic));

        let hint = parse_filename("6901234_Rtraj.nc").unwrap();
        assert_eq!(hint.category, Some(FileCategory::Trajectory));
        assert_eq!(hint.data_mode, Some(DataMode::RealTime));
        assert_eq!(hint.float_id.as_deref(), Some("6901234"));
    }

    #[test]
    fn test_unrecognised_names() {
        assert!(parse_filename("profile.nc").is_none());
        assert!(parse_filename("X1900722_001.nc").is_none());
        assert!(parse_filename("R1900722_abc.nc").is_none());
        assert!(parse_filename("6901234_meta.nc").is_none());
    }
}
