//! Conversions between `chrono` instants and Julian days.
//!
//! The solver works on Julian days so that search windows are plain `f64`
//! intervals; everything public speaks `DateTime<Utc>`.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// Mean year used for ages and orbital periods.
pub const DAYS_PER_YEAR: f64 = 365.25;

pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Julian day of the Unix epoch (1970-01-01T00:00:00Z).
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert UTC datetime to Julian Day
pub fn datetime_to_julian_day(dt: DateTime<Utc>) -> f64 {
    let seconds = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9;
    UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY
}

/// Convert Julian Day to UTC datetime, rounded to the millisecond.
///
/// Returns `None` when the day number is not finite or falls outside the
/// range `chrono` can represent.
pub fn julian_day_to_datetime(jd: f64) -> Option<DateTime<Utc>> {
    if !jd.is_finite() {
        return None;
    }
    let millis = ((jd - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// Elapsed years between two instants (negative if `to` precedes `from`).
pub fn years_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (datetime_to_julian_day(to) - datetime_to_julian_day(from)) / DAYS_PER_YEAR
}

/// `from` shifted by a fractional number of years.
pub fn add_years(from: DateTime<Utc>, years: f64) -> Option<DateTime<Utc>> {
    let millis = (years * DAYS_PER_YEAR * SECONDS_PER_DAY * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    from.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_j2000_epoch() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((datetime_to_julian_day(j2000) - 2_451_545.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_to_the_millisecond() {
        let dt = Utc.with_ymd_and_hms(1984, 1, 11, 18, 45, 0).unwrap();
        let back = julian_day_to_datetime(datetime_to_julian_day(dt)).unwrap();
        assert!((back - dt).num_milliseconds().abs() <= 1);
    }

    #[test]
    fn test_years_between() {
        let a = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let b = add_years(a, 29.46).unwrap();
        assert!((years_between(a, b) - 29.46).abs() < 1e-9);
        assert!(julian_day_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_add_years_out_of_range() {
        let a = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        // exactly i64::MIN milliseconds after rounding
        let years = -(2f64.powi(63)) / (DAYS_PER_YEAR * SECONDS_PER_DAY * 1000.0);
        assert!(add_years(a, years).is_none());
        assert!(add_years(a, -years).is_none());
        assert!(add_years(a, 1e12).is_none());
        assert!(add_years(a, f64::INFINITY).is_none());
    }
}
