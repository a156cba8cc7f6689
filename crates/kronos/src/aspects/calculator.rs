use crate::angle::{separation, signed_orb};
use crate::aspects::types::{
    AspectCore, AspectObjectRef, AspectPair, AspectSet, AspectSettings, MAJOR_ASPECTS,
};
use crate::ephemeris::types::{LayerPositions, PlanetPosition};
use std::collections::HashMap;

/// Within this many degrees an aspect counts as exact
const EXACT_ORB: f64 = 0.1;

/// Days to project forward when deciding applying vs separating
const APPLYING_LOOKAHEAD_DAYS: f64 = 0.1;

/// Aspect calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct AspectCalculator;

impl AspectCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Aspects among the bodies of a single layer (natal-only sets).
    pub fn compute_intra_layer_aspects(
        &self,
        layer_id: &str,
        positions: &LayerPositions,
        settings: &AspectSettings,
    ) -> AspectSet {
        let ids = sorted_ids(positions, settings);
        let mut pairs = Vec::new();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                if let Some(aspect) = self.calculate_aspect(
                    &positions.planets[a.as_str()],
                    &positions.planets[b.as_str()],
                    settings,
                ) {
                    pairs.push(AspectPair {
                        from: AspectObjectRef::planet(layer_id, a),
                        to: AspectObjectRef::planet(layer_id, b),
                        aspect,
                    });
                }
            }
        }

        AspectSet {
            id: layer_id.to_string(),
            label: format!("{} Aspects", capitalize_first(layer_id)),
            kind: "intra_layer".to_string(),
            layer_ids: vec![layer_id.to_string()],
            pairs,
        }
    }

    /// Transit-to-natal aspects. A body is never aspected to itself.
    pub fn compute_inter_layer_aspects(
        &self,
        from_layer: &str,
        to_layer: &str,
        from_positions: &LayerPositions,
        to_positions: &LayerPositions,
        settings: &AspectSettings,
    ) -> AspectSet {
        let from_ids = sorted_ids(from_positions, settings);
        let to_ids = sorted_ids(to_positions, settings);

        let mut pairs = Vec::new();
        for a in &from_ids {
            for b in to_ids.iter().filter(|b| *b != a) {
                if let Some(aspect) = self.calculate_aspect(
                    &from_positions.planets[a.as_str()],
                    &to_positions.planets[b.as_str()],
                    settings,
                ) {
                    pairs.push(AspectPair {
                        from: AspectObjectRef::planet(from_layer, a),
                        to: AspectObjectRef::planet(to_layer, b),
                        aspect,
                    });
                }
            }
        }

        AspectSet {
            id: format!("{from_layer}:{to_layer}"),
            label: format!(
                "{} / {} Aspects",
                capitalize_first(from_layer),
                capitalize_first(to_layer)
            ),
            kind: "inter_layer".to_string(),
            layer_ids: vec![from_layer.to_string(), to_layer.to_string()],
            pairs,
        }
    }

    /// Every intra-layer set plus every ordered-by-id inter-layer set.
    pub fn compute_all_aspect_sets(
        &self,
        layers: &HashMap<String, LayerPositions>,
        settings: &AspectSettings,
    ) -> HashMap<String, AspectSet> {
        let mut layer_ids: Vec<&String> = layers.keys().collect();
        layer_ids.sort();

        let mut sets = HashMap::new();
        for (i, a) in layer_ids.iter().enumerate() {
            let set = self.compute_intra_layer_aspects(a, &layers[*a], settings);
            sets.insert(set.id.clone(), set);
            for b in &layer_ids[i + 1..] {
                let set =
                    self.compute_inter_layer_aspects(a, b, &layers[*a], &layers[*b], settings);
                sets.insert(set.id.clone(), set);
            }
        }
        sets
    }

    /// The tightest-listed major aspect between two positions, if any is in orb.
    pub fn calculate_aspect(
        &self,
        from: &PlanetPosition,
        to: &PlanetPosition,
        settings: &AspectSettings,
    ) -> Option<AspectCore> {
        if !(from.lon.is_finite() && to.lon.is_finite()) {
            return None;
        }
        let angle = separation(to.lon, from.lon);

        MAJOR_ASPECTS.iter().find_map(|&(name, exact_angle)| {
            let orb = (angle - exact_angle).abs();
            (orb <= settings.orb_for(name)).then(|| AspectCore {
                aspect_type: name.to_string(),
                exact_angle,
                orb,
                is_applying: is_applying(from, to, exact_angle, orb),
                is_exact: orb < EXACT_ORB,
                is_retrograde: from.is_retrograde() || to.is_retrograde(),
            })
        })
    }
}

/// Applying when a short step forward at current speeds shrinks the orb.
fn is_applying(from: &PlanetPosition, to: &PlanetPosition, exact_angle: f64, orb: f64) -> bool {
    let relative_speed = from.speed_lon - to.speed_lon;
    if relative_speed.abs() < 0.01 {
        return orb < 0.5;
    }
    let now = signed_orb(to.lon, from.lon);
    let later = signed_orb(0.0, now + relative_speed * APPLYING_LOOKAHEAD_DAYS);
    (later.abs() - exact_angle).abs() < orb
}

fn sorted_ids(positions: &LayerPositions, settings: &AspectSettings) -> Vec<String> {
    let mut ids: Vec<String> = positions
        .planets
        .keys()
        .filter(|id| settings.includes(id))
        .cloned()
        .collect();
    ids.sort();
    ids
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
