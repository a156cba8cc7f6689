use criterion::{black_box, criterion_group, criterion_main, Criterion};
use chrono::{TimeZone, Utc};
use kronos::ephemeris::{LayerPositions, MeanMotionEphemeris, MeanMotionSource, PlanetPosition};
use kronos::events::DetectionInput;
use kronos::solver::{solve, SearchWindow, SolverSettings};
use kronos::time::add_years;
use kronos::Config;

const J2000: f64 = 2_451_545.0;

fn bench_solve_saturn_window(c: &mut Criterion) {
    let settings = SolverSettings::default();
    let source = MeanMotionSource::for_period(J2000, 14.6, 29.46, false);
    let window = SearchWindow::centred(J2000, settings.half_window_days(29.46));

    c.bench_function("solve_saturn_window", |b| {
        b.iter(|| solve("saturn", &source, black_box(15.24), &window, &settings))
    });
}

fn bench_solve_pluto_window(c: &mut Criterion) {
    let settings = SolverSettings::default();
    let source = MeanMotionSource::for_period(J2000, 300.0, 247.94, false);
    let window = SearchWindow::centred(J2000, settings.half_window_days(247.94));

    c.bench_function("solve_pluto_window", |b| {
        b.iter(|| solve("pluto", &source, black_box(310.0), &window, &settings))
    });
}

fn bench_full_timeline(c: &mut Criterion) {
    let config = Config::builtin();
    let birth = Utc.with_ymd_and_hms(1994, 3, 10, 12, 0, 0).unwrap();
    let now = add_years(birth, 29.84).unwrap();

    let mut natal = LayerPositions::default();
    let mut transit = LayerPositions::default();
    for (i, id) in config.tracked_bodies.iter().enumerate() {
        natal.insert(id, PlanetPosition::new(i as f64 * 40.0, 0.0));
        transit.insert(id, PlanetPosition::new(i as f64 * 40.0 + 100.0, 0.0));
    }
    let ephemeris = MeanMotionEphemeris::from_snapshot(&config, now, &transit);
    let input = DetectionInput {
        birth,
        now,
        natal: &natal,
        transit: &transit,
        progressed: None,
    };

    c.bench_function("build_timeline", |b| {
        b.iter(|| kronos::build_timeline(&config, &ephemeris, black_box(&input)))
    });
}

criterion_group!(
    benches,
    bench_solve_saturn_window,
    bench_solve_pluto_window,
    bench_full_timeline
);
criterion_main!(benches);
