use std::fmt;

use serde::{Deserialize, Serialize};

/// A single-digit ARGO quality-control flag (0-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QcFlag(u8);

impl QcFlag {
    /// No QC was performed
    pub const NO_QC: QcFlag = QcFlag(0);
    /// Good data
    pub const GOOD: QcFlag = QcFlag(1);
    /// Probably good data
    pub const PROBABLY_GOOD: QcFlag = QcFlag(2);
    /// Probably bad data that are potentially correctable
    pub const PROBABLY_BAD: QcFlag = QcFlag(3);
    /// Bad data
    pub const BAD: QcFlag = QcFlag(4);
    /// Value changed
    pub const CHANGED: QcFlag = QcFlag(5);
    /// Estimated value (interpolated, extrapolated or other estimation)
    pub const ESTIMATED: QcFlag = QcFlag(8);
    /// Missing value
    pub const MISSING: QcFlag = QcFlag(9);

    /// Create a flag from its numeric value
    pub fn new(value: u8) -> Option<Self> {
        (value <= 9).then_some(QcFlag(value))
    }

    /// Numeric value
    pub fn value(self) -> u8 {
        self.0
    }

    /// Flags 6 and 7 are reserved by the ARGO manual and never valid in data
    pub fn is_reserved(self) -> bool {
        matches!(self.0, 6 | 7)
    }

    /// Flags 1 and 2
    pub fn is_good(self) -> bool {
        matches!(self.0, 1 | 2)
    }
}

impl fmt::Display for QcFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded content of one QC character cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcCell {
    /// A digit flag
    Flag(QcFlag),
    /// Blank / NUL: no flag assigned (fill)
    Blank,
    /// Any other byte
    Invalid(u8),
}

impl QcCell {
    /// Decode a QC character as stored in ARGO files ('0'..'9', ' ' for fill)
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0'..=b'9' => QcCell::Flag(QcFlag(byte - b'0')),
            b' ' | 0 => QcCell::Blank,
            other => QcCell::Invalid(other),
        }
    }

    /// Histogram key: the digit, `"blank"` or `"invalid"`
    pub fn histogram_key(self) -> String {
        match self {
            QcCell::Flag(flag) => flag.to_string(),
            QcCell::Blank => "blank".to_string(),
            QcCell::Invalid(_) => "invalid".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_cells() {
        assert_eq!(QcCell::from_byte(b'1'), QcCell::Flag(QcFlag::GOOD));
        assert_eq!(QcCell::from_byte(b'9'), QcCell::Flag(QcFlag::MISSING));
        assert_eq!(QcCell::from_byte(b' '), QcCell::Blank);
        assert_eq!(QcCell::from_byte(0), QcCell::Blank);
        assert_eq!(QcCell::from_byte(b'A'), QcCell::Invalid(b'A'));
    }

    #[test]
    fn test_reserved_flags() {
        assert!(QcFlag::new(6).unwrap().is_reserved());
        assert!(QcFlag::new(7).unwrap().is_reserved());
        assert!(!QcFlag::ESTIMATED.is_reserved());
        assert!(QcFlag::new(10).is_none());
    }

    #[test]
    fn test_histogram_keys() {
        assert_eq!(QcCell::from_byte(b'4').histogram_key(), "4");
        assert_eq!(QcCell::Blank.histogram_key(), "blank");
    }
}
