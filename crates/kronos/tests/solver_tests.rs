use chrono::{Duration, TimeZone, Utc};
use kronos::angle::signed_orb;
use kronos::ephemeris::{LongitudeSample, LongitudeSource, MeanMotionSource, TabulatedSource};
use kronos::error::DataError;
use kronos::solver::{solve, CrossingPolicy, RootSearch, SearchWindow, SolverSettings};
use kronos::time::{datetime_to_julian_day, MINUTES_PER_DAY};

const J2000: f64 = 2_451_545.0;

/// Longitude that swings back and forth: 10 + 5 sin(2π t / 100)
struct Oscillator;

impl LongitudeSource for Oscillator {
    fn longitude_at(&self, jd: f64) -> Result<f64, DataError> {
        let t = jd - J2000;
        Ok(10.0 + 5.0 * (2.0 * std::f64::consts::PI * t / 100.0).sin())
    }

    fn max_speed(&self) -> f64 {
        5.0 * 2.0 * std::f64::consts::PI / 100.0
    }
}

struct Broken;

impl LongitudeSource for Broken {
    fn longitude_at(&self, _jd: f64) -> Result<f64, DataError> {
        Ok(f64::NAN)
    }

    fn max_speed(&self) -> f64 {
        1.0
    }
}

#[test]
fn test_finds_mean_motion_crossing_within_a_minute() {
    // 1 degree per day from 0 at J2000: 45 degrees is reached at J2000 + 45
    let source = MeanMotionSource::new(J2000, 0.0, 1.0);
    let window = SearchWindow::new(J2000, J2000 + 100.0, J2000);
    let settings = SolverSettings::default();

    let result = solve("test", &source, 45.0, &window, &settings).unwrap();
    let RootSearch::Found(root) = result else {
        panic!("expected a root, got {result:?}");
    };
    assert!((root.jd - (J2000 + 45.0)).abs() * MINUTES_PER_DAY < 1.0);
    assert!(root.precise);
}

#[test]
fn test_crossing_through_zero_degrees() {
    let source = MeanMotionSource::new(J2000, 350.0, 1.0);
    let window = SearchWindow::new(J2000, J2000 + 30.0, J2000);

    let result = solve("test", &source, 2.0, &window, &SolverSettings::default()).unwrap();
    let root = result.root().unwrap();
    assert!((root.jd - (J2000 + 12.0)).abs() < 1.0 / MINUTES_PER_DAY);
}

#[test]
fn test_seam_is_not_reported_as_a_root() {
    // body stays 170..190 degrees from the target the whole time
    let source = MeanMotionSource::new(J2000, 170.0, 0.5);
    let window = SearchWindow::new(J2000, J2000 + 40.0, J2000);

    let result = solve("test", &source, 0.0, &window, &SolverSettings::default()).unwrap();
    assert_eq!(result, RootSearch::NotFound);
}

#[test]
fn test_window_without_crossing_is_not_found() {
    let source = MeanMotionSource::new(J2000, 100.0, 0.1);
    let window = SearchWindow::new(J2000, J2000 + 50.0, J2000);

    let result = solve("test", &source, 200.0, &window, &SolverSettings::default()).unwrap();
    assert_eq!(result, RootSearch::NotFound);
}

#[test]
fn test_retrograde_loop_picks_crossing_nearest_reference() {
    // 10 + 5 sin(...) crosses 12 at t ≈ 6.55 and t ≈ 43.45 in [0, 100]
    let settings = SolverSettings::default();

    let near_start = SearchWindow::new(J2000, J2000 + 100.0, J2000);
    let early = solve("test", &Oscillator, 12.0, &near_start, &settings).unwrap();
    let early_jd = early.root().unwrap().jd - J2000;
    assert!((early_jd - 6.550).abs() < 0.01, "got {early_jd}");

    let near_middle = SearchWindow::new(J2000, J2000 + 100.0, J2000 + 40.0);
    let late = solve("test", &Oscillator, 12.0, &near_middle, &settings).unwrap();
    let late_jd = late.root().unwrap().jd - J2000;
    assert!((late_jd - 43.450).abs() < 0.01, "got {late_jd}");
}

#[test]
fn test_crossing_policies() {
    let window = SearchWindow::new(J2000, J2000 + 100.0, J2000 + 40.0);
    let earliest = SolverSettings {
        crossing_policy: CrossingPolicy::Earliest,
        ..SolverSettings::default()
    };
    let latest = SolverSettings {
        crossing_policy: CrossingPolicy::Latest,
        ..SolverSettings::default()
    };

    let first = solve("test", &Oscillator, 12.0, &window, &earliest).unwrap();
    let last = solve("test", &Oscillator, 12.0, &window, &latest).unwrap();
    assert!(first.root().unwrap().jd < J2000 + 10.0);
    assert!(last.root().unwrap().jd > J2000 + 40.0);
}

#[test]
fn test_iteration_cap_reports_degenerate() {
    let source = MeanMotionSource::new(J2000, 0.0, 1.0);
    let window = SearchWindow::new(J2000, J2000 + 100.0, J2000);
    let settings = SolverSettings {
        max_iterations: 2,
        ..SolverSettings::default()
    };

    let result = solve("test", &source, 47.3, &window, &settings).unwrap();
    let RootSearch::Degenerate(root) = result else {
        panic!("expected a degenerate root, got {result:?}");
    };
    assert!(!root.precise);
    assert!(root.interval.0 <= J2000 + 47.3 && J2000 + 47.3 <= root.interval.1);
}

#[test]
fn test_non_finite_longitude_is_a_data_error() {
    let window = SearchWindow::new(J2000, J2000 + 10.0, J2000);
    let err = solve("mars", &Broken, 0.0, &window, &SolverSettings::default()).unwrap_err();
    assert!(matches!(err, DataError::NonFinite { .. }));
    assert_eq!(err.body(), "mars");
}

#[test]
fn test_tabulated_source_with_retrograde_station() {
    // forward to 20, back to 14, forward again: three crossings of 16
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let lons = [10.0, 15.0, 20.0, 17.0, 14.0, 18.0, 22.0];
    let samples: Vec<LongitudeSample> = lons
        .iter()
        .enumerate()
        .map(|(i, &lon)| LongitudeSample {
            at: t0 + Duration::days(10 * i as i64),
            lon,
        })
        .collect();
    let source = TabulatedSource::new("mars", &samples).unwrap();
    let start = datetime_to_julian_day(t0);
    let window = SearchWindow::new(start, start + 59.0, start + 35.0);

    let result = solve("mars", &source, 16.0, &window, &SolverSettings::default()).unwrap();
    let root = result.root().unwrap();
    // crossings at days 12, 33.3 and 45; the retrograde pass is nearest day 35
    assert!((root.jd - start - 33.333).abs() < 0.01);
    let lon = source.longitude_at(root.jd).unwrap();
    assert!(signed_orb(16.0, lon).abs() < 1e-3);
}

#[test]
fn test_window_is_clamped_to_tabulated_coverage() {
    // 30 days of samples, 1 degree per day from 0
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let samples: Vec<LongitudeSample> = (0..=30)
        .map(|day| LongitudeSample {
            at: t0 + Duration::days(day),
            lon: day as f64,
        })
        .collect();
    let source = TabulatedSource::new("saturn", &samples).unwrap();
    let start = datetime_to_julian_day(t0);

    // reaches well past both ends of the samples
    let wide = SearchWindow::centred(start + 15.0, 200.0);
    let result = solve("saturn", &source, 12.5, &wide, &SolverSettings::default()).unwrap();
    assert!((result.root().unwrap().jd - start - 12.5).abs() < 1.0 / MINUTES_PER_DAY);

    // entirely after the last sample
    let beyond = SearchWindow::new(start + 40.0, start + 90.0, start + 60.0);
    let result = solve("saturn", &source, 12.5, &beyond, &SolverSettings::default()).unwrap();
    assert_eq!(result, RootSearch::NotFound);
}
