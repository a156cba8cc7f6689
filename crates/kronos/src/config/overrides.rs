//! Partial TOML overrides layered onto the built-in tables.
//!
//! Every field is optional. Lists (`tracked_bodies`, `major_transits`,
//! `life_stages`) replace the built-in list wholesale; `[bodies.<id>]` tables
//! patch one body, or add it when the id is new.

use serde::Deserialize;
use std::collections::HashMap;

use super::{CelestialBody, Config, KeywordTable, LifeStage, MajorTransit, SignificanceTable};
use crate::aspects::triage::TierThresholds;
use crate::cycles::{CycleMarker, Significance};
use crate::error::ConfigError;
use crate::solver::CrossingPolicy;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    tracked_bodies: Option<Vec<String>>,
    response_budget_bytes: Option<usize>,
    envelope_bytes: Option<usize>,
    tiers: Option<TiersToml>,
    solver: Option<SolverToml>,
    timeline: Option<TimelineToml>,
    progressed_moon: Option<ProgressedMoonToml>,
    #[serde(default)]
    bodies: HashMap<String, BodyToml>,
    major_transits: Option<Vec<MajorTransit>>,
    life_stages: Option<Vec<LifeStage>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TiersToml {
    tight: Option<f64>,
    moderate: Option<f64>,
    loose: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SolverToml {
    tolerance_minutes: Option<f64>,
    max_iterations: Option<u32>,
    max_step_days: Option<f64>,
    max_samples: Option<usize>,
    crossing_policy: Option<CrossingPolicy>,
    window_fraction: Option<f64>,
    min_window_days: Option<f64>,
    max_window_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimelineToml {
    max_future_events: Option<usize>,
    max_past_events: Option<usize>,
    future_years: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProgressedMoonToml {
    orb: Option<f64>,
    period_years: Option<f64>,
    significance: Option<Significance>,
    keywords: Option<Vec<String>>,
    interpretation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BodyToml {
    name: Option<String>,
    orbital_period_years: Option<f64>,
    return_orb: Option<f64>,
    mean_motion_retrograde: Option<bool>,
    default_significance: Option<Significance>,
    /// Keyed by cycle marker: "1", "2", "square", "opposition"
    #[serde(default)]
    significance: HashMap<String, Significance>,
    keywords: Option<Vec<String>>,
    /// Keyed by tier name: "critical", "high", ...
    #[serde(default)]
    tier_keywords: HashMap<String, Vec<String>>,
    #[serde(default)]
    interpretations: HashMap<String, String>,
    default_interpretation: Option<String>,
}

pub(super) fn apply_toml(config: &mut Config, text: &str) -> Result<(), ConfigError> {
    let parsed: ConfigToml =
        toml::from_str(text).map_err(|e| ConfigError::InvalidToml(e.to_string()))?;

    if let Some(tracked) = parsed.tracked_bodies {
        config.tracked_bodies = tracked;
    }
    if let Some(budget) = parsed.response_budget_bytes {
        config.response_budget_bytes = budget;
    }
    if let Some(envelope) = parsed.envelope_bytes {
        config.envelope_bytes = envelope;
    }
    if let Some(tiers) = parsed.tiers {
        let current = config.tiers;
        config.tiers = TierThresholds {
            tight: tiers.tight.unwrap_or(current.tight),
            moderate: tiers.moderate.unwrap_or(current.moderate),
            loose: tiers.loose.unwrap_or(current.loose),
        };
    }
    if let Some(solver) = parsed.solver {
        let s = &mut config.solver;
        if let Some(v) = solver.tolerance_minutes {
            s.tolerance_minutes = v;
        }
        if let Some(v) = solver.max_iterations {
            s.max_iterations = v;
        }
        if let Some(v) = solver.max_step_days {
            s.max_step_days = v;
        }
        if let Some(v) = solver.max_samples {
            s.max_samples = v;
        }
        if let Some(v) = solver.crossing_policy {
            s.crossing_policy = v;
        }
        if let Some(v) = solver.window_fraction {
            s.window_fraction = v;
        }
        if let Some(v) = solver.min_window_days {
            s.min_window_days = v;
        }
        if let Some(v) = solver.max_window_attempts {
            s.max_window_attempts = v;
        }
    }
    if let Some(timeline) = parsed.timeline {
        let t = &mut config.timeline;
        if let Some(v) = timeline.max_future_events {
            t.max_future_events = v;
        }
        if let Some(v) = timeline.max_past_events {
            t.max_past_events = v;
        }
        if let Some(v) = timeline.future_years {
            t.future_years = v;
        }
    }
    if let Some(progressed) = parsed.progressed_moon {
        let p = &mut config.progressed_moon;
        if let Some(v) = progressed.orb {
            p.orb = v;
        }
        if let Some(v) = progressed.period_years {
            p.period_years = v;
        }
        if let Some(v) = progressed.significance {
            p.significance = v;
        }
        if let Some(v) = progressed.keywords {
            p.keywords = v;
        }
        if let Some(v) = progressed.interpretation {
            p.interpretation = v;
        }
    }

    // sorted so that error reporting is deterministic
    let mut bodies: Vec<(String, BodyToml)> = parsed.bodies.into_iter().collect();
    bodies.sort_by(|a, b| a.0.cmp(&b.0));
    for (id, patch) in bodies {
        apply_body(config, id, patch)?;
    }

    if let Some(transits) = parsed.major_transits {
        config.major_transits = transits;
    }
    if let Some(stages) = parsed.life_stages {
        config.life_stages = stages;
    }
    Ok(())
}

fn apply_body(config: &mut Config, id: String, patch: BodyToml) -> Result<(), ConfigError> {
    let index = match config.bodies.iter().position(|b| b.id == id) {
        Some(index) => index,
        None => {
            let period = patch
                .orbital_period_years
                .ok_or_else(|| missing_field(&id, "orbital_period_years"))?;
            let orb = patch.return_orb.ok_or_else(|| missing_field(&id, "return_orb"))?;
            config.bodies.push(CelestialBody {
                id: id.clone(),
                name: id.clone(),
                orbital_period_years: period,
                return_orb: orb,
                mean_motion_retrograde: false,
                significance: SignificanceTable {
                    default: Significance::Moderate,
                    by_marker: HashMap::new(),
                },
                keywords: KeywordTable::default(),
                interpretations: HashMap::new(),
                default_interpretation: None,
            });
            config.bodies.len() - 1
        }
    };
    let body = &mut config.bodies[index];

    if let Some(name) = patch.name {
        body.name = name;
    }
    if let Some(period) = patch.orbital_period_years {
        body.orbital_period_years = period;
    }
    if let Some(orb) = patch.return_orb {
        body.return_orb = orb;
    }
    if let Some(retrograde) = patch.mean_motion_retrograde {
        body.mean_motion_retrograde = retrograde;
    }
    if let Some(default) = patch.default_significance {
        body.significance.default = default;
    }
    for (marker, tier) in patch.significance {
        body.significance.by_marker.insert(marker.parse::<CycleMarker>()?, tier);
    }
    if let Some(keywords) = patch.keywords {
        body.keywords.base = keywords;
    }
    for (tier, keywords) in patch.tier_keywords {
        body.keywords.by_tier.insert(tier.parse::<Significance>()?, keywords);
    }
    for (marker, text) in patch.interpretations {
        body.interpretations.insert(marker.parse::<CycleMarker>()?, text);
    }
    if let Some(text) = patch.default_interpretation {
        body.default_interpretation = Some(text);
    }
    Ok(())
}

fn missing_field(id: &str, field: &str) -> ConfigError {
    ConfigError::InvalidFieldValue {
        field: format!("bodies.{id}.{field}"),
        message: "required when adding a new body".to_string(),
    }
}
