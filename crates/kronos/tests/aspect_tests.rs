use kronos::aspects::{AspectCalculator, AspectSettings};
use kronos::ephemeris::{LayerPositions, PlanetPosition};
use std::collections::HashMap;

fn layer(bodies: &[(&str, f64, f64)]) -> LayerPositions {
    bodies
        .iter()
        .map(|(id, lon, speed)| (id.to_string(), PlanetPosition::new(*lon, *speed)))
        .collect()
}

#[test]
fn test_calculate_aspect_conjunction() {
    let calculator = AspectCalculator::new();
    let settings = AspectSettings::default();

    // 2 degrees apart, well inside the default 8 degree orb
    let a = PlanetPosition::new(100.0, 1.0);
    let b = PlanetPosition::new(102.0, 1.0);

    let aspect = calculator.calculate_aspect(&a, &b, &settings).unwrap();
    assert_eq!(aspect.aspect_type, "conjunction");
    assert!((aspect.orb - 2.0).abs() < 1e-9);
    assert!(!aspect.is_exact);
}

#[test]
fn test_calculate_aspect_opposition_across_zero() {
    let calculator = AspectCalculator::new();
    let settings = AspectSettings::default();

    let a = PlanetPosition::new(359.0, 1.0);
    let b = PlanetPosition::new(178.5, 0.1);

    let aspect = calculator.calculate_aspect(&a, &b, &settings).unwrap();
    assert_eq!(aspect.aspect_type, "opposition");
    assert!((aspect.orb - 0.5).abs() < 1e-9);
}

#[test]
fn test_per_type_orb_is_respected() {
    let calculator = AspectCalculator::new();
    let mut orb_settings = HashMap::new();
    orb_settings.insert("sextile".to_string(), 2.0);
    let settings = AspectSettings {
        orb_settings,
        include_objects: vec![],
    };

    // 63 degrees: 3 degrees from a sextile, outside its 2 degree orb
    let a = PlanetPosition::new(10.0, 1.0);
    let b = PlanetPosition::new(73.0, 1.0);
    assert!(calculator.calculate_aspect(&a, &b, &settings).is_none());
}

#[test]
fn test_retrograde_flag() {
    let calculator = AspectCalculator::new();
    let a = PlanetPosition::new(10.0, -0.2);
    let b = PlanetPosition::new(100.0, 1.0);
    let aspect = calculator
        .calculate_aspect(&a, &b, &AspectSettings::default())
        .unwrap();
    assert_eq!(aspect.aspect_type, "square");
    assert!(aspect.is_exact);
    assert!(aspect.is_retrograde);
}

#[test]
fn test_compute_intra_layer_aspects() {
    let calculator = AspectCalculator::new();
    let natal = layer(&[("sun", 100.0, 1.0), ("moon", 102.0, 13.0), ("mars", 250.0, 0.5)]);

    let set = calculator.compute_intra_layer_aspects("natal", &natal, &AspectSettings::default());

    assert_eq!(set.kind, "intra_layer");
    assert_eq!(set.label, "Natal Aspects");
    assert_eq!(set.pairs.len(), 1);
    assert_eq!(set.pairs[0].from.object_id, "moon");
    assert_eq!(set.pairs[0].to.object_id, "sun");
}

#[test]
fn test_transit_to_natal_skips_self_pairs() {
    let calculator = AspectCalculator::new();
    let transit = layer(&[("saturn", 14.6, 0.03), ("jupiter", 16.0, 0.08)]);
    let natal = layer(&[("saturn", 15.24, 0.0), ("sun", 104.0, 1.0)]);

    let set = calculator.compute_inter_layer_aspects(
        "transit",
        "natal",
        &transit,
        &natal,
        &AspectSettings::default(),
    );

    assert_eq!(set.id, "transit:natal");
    assert!(set.pairs.iter().all(|p| !p.is_self_aspect()));
    // jupiter conjunct natal saturn, jupiter and saturn square natal sun
    assert_eq!(set.pairs.len(), 3);
}

#[test]
fn test_include_objects_filter() {
    let calculator = AspectCalculator::new();
    let natal = layer(&[("sun", 0.0, 1.0), ("moon", 1.0, 13.0), ("venus", 2.0, 1.2)]);
    let settings = AspectSettings {
        include_objects: vec!["sun".to_string(), "venus".to_string()],
        ..AspectSettings::default()
    };

    let set = calculator.compute_intra_layer_aspects("natal", &natal, &settings);
    assert_eq!(set.pairs.len(), 1);
}

#[test]
fn test_compute_all_aspect_sets() {
    let calculator = AspectCalculator::new();
    let mut layers = HashMap::new();
    layers.insert("natal".to_string(), layer(&[("sun", 10.0, 1.0), ("moon", 70.0, 13.0)]));
    layers.insert("transit".to_string(), layer(&[("mars", 12.0, 0.6)]));

    let sets = calculator.compute_all_aspect_sets(&layers, &AspectSettings::default());
    assert_eq!(sets.len(), 3);
    assert!(sets.contains_key("natal:transit"));
    assert_eq!(sets["natal"].pairs.len(), 1);
}
