//! JULD decoding.
//!
//! ARGO stores times as fractional days since 1950-01-01T00:00:00Z. The
//! fractional part is the time of day and is kept to the microsecond.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Days between the ARGO reference date and the Unix epoch
pub const ARGO_EPOCH_TO_UNIX_DAYS: f64 = 7305.0;

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// The ARGO reference date, 1950-01-01T00:00:00Z
pub fn argo_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Convert a JULD day offset to an absolute UTC timestamp
pub fn juld_to_datetime(days: f64) -> Option<DateTime<Utc>> {
    if !days.is_finite() {
        return None;
    }
    let micros = (days * MICROS_PER_DAY).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    argo_epoch().checked_add_signed(Duration::microseconds(micros as i64))
}

/// Convert a UTC timestamp back to a JULD day offset
pub fn datetime_to_juld(time: DateTime<Utc>) -> f64 {
    let delta = time.signed_duration_since(argo_epoch());
    match delta.num_microseconds() {
        Some(us) => us as f64 / MICROS_PER_DAY,
        None => delta.num_milliseconds() as f64 / 86_400_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_epoch_offset() {
        let unix = juld_to_datetime(ARGO_EPOCH_TO_UNIX_DAYS).unwrap();
        assert_eq!(unix.timestamp(), 0);
    }

    #[test]
    fn test_fractional_days_are_kept() {
        // 2019-06-01 is day 25353; .75 is 18:00 UTC
        let t = juld_to_datetime(25353.75).unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2019, 6, 1));
        assert_eq!((t.hour(), t.minute()), (18, 0));

        let t = juld_to_datetime(25353.5 + 1.0 / 86_400.0).unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (12, 0, 1));
    }

    #[test]
    fn test_round_trip() {
        let t = juld_to_datetime(24000.123456).unwrap();
        assert!((datetime_to_juld(t) - 24000.123456).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite() {
        assert!(juld_to_datetime(f64::NAN).is_none());
    }
}
