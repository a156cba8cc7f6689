use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kronos::aspects::{
    paginate, triage, AspectCalculator, AspectPriority, AspectSettings, JsonSizeEstimator,
    ResponseBudget, TierThresholds,
};
use kronos::ephemeris::{LayerPositions, PlanetPosition};
use kronos::Config;

fn layer(offset: f64) -> LayerPositions {
    (0..14)
        .map(|i| {
            (
                format!("body_{i}"),
                PlanetPosition::new((i as f64 * 27.3 + offset) % 360.0, 1.0),
            )
        })
        .collect()
}

fn bench_triage(c: &mut Criterion) {
    let set = AspectCalculator::new().compute_inter_layer_aspects(
        "transit",
        "natal",
        &layer(3.0),
        &layer(0.0),
        &AspectSettings::default(),
    );
    let thresholds = TierThresholds::default();

    c.bench_function("triage_transit_natal", |b| {
        b.iter(|| triage(black_box(&set.pairs), &thresholds))
    });
}

fn bench_paginate(c: &mut Criterion) {
    let config = Config::builtin();
    let set = AspectCalculator::new().compute_inter_layer_aspects(
        "transit",
        "natal",
        &layer(3.0),
        &layer(0.0),
        &AspectSettings::default(),
    );
    let triaged = triage(&set.pairs, &config.tiers);
    let budget = ResponseBudget::from_config(&config);

    c.bench_function("paginate_tight", |b| {
        b.iter(|| paginate(black_box(&triaged), AspectPriority::Tight, &budget, &JsonSizeEstimator))
    });
}

criterion_group!(benches, bench_triage, bench_paginate);
criterion_main!(benches);
