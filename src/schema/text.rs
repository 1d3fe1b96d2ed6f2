//! Tolerant decoding of fixed-width character fields.

use std::fmt;

use serde::Serialize;

/// What went wrong while decoding a character field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeIssue {
    /// Bytes were not valid UTF-8 and were read as Windows-1252
    NotUtf8,
    /// Control or other non-printable characters were removed
    NonPrintable,
}

/// Best-effort text recovered from a field that did not decode cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    /// Recovered text
    pub text: String,
    /// Problems encountered, in detection order
    pub issues: Vec<DecodeIssue>,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issues: Vec<&str> = self
            .issues
            .iter()
            .map(|issue| match issue {
                DecodeIssue::NotUtf8 => "not valid UTF-8, decoded as Windows-1252",
                DecodeIssue::NonPrintable => "non-printable bytes removed",
            })
            .collect();
        write!(f, "{} (recovered {:?})", issues.join("; "), self.text)
    }
}

impl DecodeWarning {
    /// The recovered text, discarding the warning
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Decode a fixed-width character field into normalised text.
///
/// Trailing NUL and blank padding is removed silently. Invalid UTF-8 falls
/// back to Windows-1252 (a superset of Latin-1) and non-printable
/// characters are dropped; both still produce text, returned inside the
/// [`DecodeWarning`].
pub fn decode_text(bytes: &[u8]) -> Result<String, DecodeWarning> {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0 && *b != b' ')
        .map_or(0, |i| i + 1);
    let bytes = &bytes[..end];

    let mut issues = Vec::new();
    let decoded = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            issues.push(DecodeIssue::NotUtf8);
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    };

    let printable: String = decoded.chars().filter(|c| !c.is_control()).collect();
    if printable.len() != decoded.len() {
        issues.push(DecodeIssue::NonPrintable);
    }
    let text = printable.trim().to_string();

    if issues.is_empty() {
        Ok(text)
    } else {
        Err(DecodeWarning { text, issues })
    }
}

/// Decode, keeping the best-effort text either way
pub fn decode_lossy(bytes: &[u8]) -> String {
    decode_text(bytes).unwrap_or_else(DecodeWarning::into_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_padding_is_not_a_warning() {
        assert_eq!(decode_text(b"5904859 "), Ok("5904859".to_string()));
        assert_eq!(decode_text(b"ARGO\0\0\0\0"), Ok("ARGO".to_string()));
        assert_eq!(decode_text(b"        "), Ok(String::new()));
        assert_eq!(decode_text(b"  CORIOLIS"), Ok("CORIOLIS".to_string()));
    }

    #[test]
    fn test_single_byte_fallback() {
        let warning = decode_text(b"Lefebvre \xe9quipe").unwrap_err();
        assert_eq!(warning.text, "Lefebvre équipe");
        assert_eq!(warning.issues, vec![DecodeIssue::NotUtf8]);
        // 0x80 is the euro sign in Windows-1252, a C1 control in Latin-1
        assert_eq!(decode_lossy(b"\x80 5"), "€ 5");
    }

    #[test]
    fn test_control_bytes_stripped() {
        let warning = decode_text(b"PI\x01 NAME\x07").unwrap_err();
        assert_eq!(warning.text, "PI NAME");
        assert_eq!(warning.issues, vec![DecodeIssue::NonPrintable]);
        assert_eq!(decode_lossy(b"A\0B"), "AB");
    }

    proptest! {
        #[test]
        fn decoded_text_is_printable_and_trimmed(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let text = decode_lossy(&bytes);
            prop_assert!(text.chars().all(|c| !c.is_control()));
            prop_assert_eq!(text.trim(), text.as_str());
        }

        #[test]
        fn printable_ascii_round_trips(s in "[A-Za-z0-9_ ]{0,32}") {
            let mut padded = s.clone().into_bytes();
            padded.extend_from_slice(b"    ");
            prop_assert_eq!(decode_text(&padded), Ok(s.trim().to_string()));
        }
    }
}
