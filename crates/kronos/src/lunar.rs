//! Monthly lunar return: the moment the transiting Moon comes back to the
//! natal Moon's longitude inside one calendar month.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::angle::normalize;
use crate::ephemeris::LongitudeSource;
use crate::error::{ensure_finite, DataError};
use crate::events::Precision;
use crate::solver::{solve, CrossingPolicy, RootSearch, SearchWindow, SolverSettings};
use crate::time::{datetime_to_julian_day, julian_day_to_datetime};

const MOON: &str = "moon";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LunarReturn {
    pub year: i32,
    pub month: u32,
    pub natal_longitude: f64,
    pub jd: f64,
    pub exact_date: DateTime<Utc>,
    pub precision: Precision,
}

/// Midnight UTC on the 1st of `month` up to midnight on the 1st of the next.
pub fn month_window(year: i32, month: u32) -> Option<SearchWindow> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let start = datetime_to_julian_day(first.and_hms_opt(0, 0, 0)?.and_utc());
    let end = datetime_to_julian_day(next.and_hms_opt(0, 0, 0)?.and_utc());
    Some(SearchWindow::new(start, end, start))
}

/// First return of the Moon to `natal_moon_lon` during `year`-`month`.
///
/// `Ok(None)` means the month holds no crossing the source can see, which
/// happens when its samples stop short of the month.
pub fn lunar_return(
    source: &dyn LongitudeSource,
    natal_moon_lon: f64,
    year: i32,
    month: u32,
    settings: &SolverSettings,
) -> Result<Option<LunarReturn>, DataError> {
    let window = month_window(year, month).ok_or_else(|| DataError::InvalidMonth {
        body: MOON.to_string(),
        year,
        month,
    })?;
    let target = normalize(ensure_finite(MOON, "natal longitude", natal_moon_lon)?);
    let settings = SolverSettings {
        crossing_policy: CrossingPolicy::Earliest,
        ..settings.clone()
    };

    let (root, precision) = match solve(MOON, source, target, &window, &settings)? {
        RootSearch::Found(root) => (root, Precision::Exact),
        RootSearch::Degenerate(root) => (root, Precision::Reduced),
        RootSearch::NotFound => {
            log::debug!("No lunar return to {target:.2} in {year}-{month:02}");
            return Ok(None);
        }
    };

    Ok(julian_day_to_datetime(root.jd).map(|exact_date| LunarReturn {
        year,
        month,
        natal_longitude: target,
        jd: root.jd,
        exact_date,
        precision,
    }))
}
