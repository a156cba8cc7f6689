//! The immutable configuration value threaded through every entry point.
//!
//! `Config::builtin()` carries the static tables; `Config::from_toml_str`
//! layers partial overrides on top of them. Both paths end in `validate`, so
//! a `Config` that exists is a `Config` the pipelines can trust.

mod defaults;
mod overrides;

use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use crate::aspects::triage::TierThresholds;
use crate::cycles::{CycleMarker, Significance};
use crate::error::ConfigError;
use crate::solver::SolverSettings;

pub use defaults::BUILTIN_CONFIG;

/// Per-body significance: explicit markers plus a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceTable {
    pub default: Significance,
    pub by_marker: HashMap<CycleMarker, Significance>,
}

/// Keywords for a body, optionally specialised per significance tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordTable {
    pub base: Vec<String>,
    pub by_tier: HashMap<Significance, Vec<String>>,
}

/// A celestial body the lifecycle pipeline knows about.
#[derive(Debug, Clone, PartialEq)]
pub struct CelestialBody {
    /// Lowercase id matching the chart engine's planet ids ("saturn", "north_node")
    pub id: String,
    /// Display name ("Saturn", "North Node")
    pub name: String,
    pub orbital_period_years: f64,
    /// Max |orb| in degrees for a return to count as active
    pub return_orb: f64,
    /// Mean motion runs backwards through the zodiac (lunar nodes)
    pub mean_motion_retrograde: bool,
    pub significance: SignificanceTable,
    pub keywords: KeywordTable,
    pub interpretations: HashMap<CycleMarker, String>,
    pub default_interpretation: Option<String>,
}

/// A non-return transit of a body to its own natal position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MajorTransit {
    pub name: String,
    pub body: String,
    /// Offset from the natal longitude, in degrees (90 square, 180 opposition)
    pub aspect_angle: f64,
    pub marker: CycleMarker,
    /// Max |orb| in degrees for the transit to count as active
    pub orb: f64,
    /// Age at which the first occurrence usually falls
    pub typical_age: f64,
    pub age_range: (f64, f64),
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl MajorTransit {
    /// Snake-case id derived from the name ("Uranus Opposition" -> "uranus_opposition").
    pub fn id(&self) -> String {
        self.name.to_lowercase().replace(' ', "_")
    }
}

/// An age band used when no active event names the current life stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LifeStage {
    pub name: String,
    pub description: String,
    pub min_age: f64,
    pub max_age: f64,
    #[serde(default)]
    pub themes: Vec<String>,
}

/// The secondary-progressed Moon coming back to the natal Moon.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressedMoonSettings {
    /// Max |orb| in degrees between progressed and natal Moon
    pub orb: f64,
    /// One full progressed lunar cycle
    pub period_years: f64,
    pub significance: Significance,
    pub keywords: Vec<String>,
    pub interpretation: String,
}

impl ProgressedMoonSettings {
    /// Days the progressed Moon needs to cover `orb` degrees.
    pub fn half_window_days(&self) -> f64 {
        self.orb / (360.0 / (self.period_years * crate::time::DAYS_PER_YEAR))
    }
}

/// Timeline truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSettings {
    pub max_future_events: usize,
    pub max_past_events: usize,
    /// Future events further out than this are dropped
    pub future_years: f64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            max_future_events: 10,
            max_past_events: 10,
            future_years: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bodies: Vec<CelestialBody>,
    /// Bodies the return detector runs over, in report order
    pub tracked_bodies: Vec<String>,
    pub major_transits: Vec<MajorTransit>,
    pub life_stages: Vec<LifeStage>,
    pub tiers: TierThresholds,
    /// Serialized-size budget for one aspect page
    pub response_budget_bytes: usize,
    /// Bytes reserved for summary and pagination fields around the items
    pub envelope_bytes: usize,
    pub solver: SolverSettings,
    pub timeline: TimelineSettings,
    pub progressed_moon: ProgressedMoonSettings,
}

impl Config {
    /// The built-in static tables.
    pub fn builtin() -> Self {
        BUILTIN_CONFIG.clone()
    }

    /// Built-in tables with the overrides in `text` applied.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::builtin();
        overrides::apply_toml(&mut config, text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn body(&self, id: &str) -> Option<&CelestialBody> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_ids(&self) -> Vec<String> {
        self.bodies.iter().map(|b| b.id.clone()).collect()
    }

    /// Age band containing `age`; the last band absorbs anything beyond it.
    pub fn life_stage(&self, age: f64) -> Option<&LifeStage> {
        self.life_stages
            .iter()
            .find(|s| s.min_age <= age && age < s.max_age)
            .or_else(|| {
                self.life_stages
                    .iter()
                    .filter(|s| age >= s.max_age)
                    .max_by(|a, b| a.max_age.total_cmp(&b.max_age))
            })
    }

    /// Reject anything the pipelines can't run on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for body in &self.bodies {
            if !seen.insert(body.id.as_str()) {
                return Err(ConfigError::InvalidFieldValue {
                    field: "bodies".to_string(),
                    message: format!("duplicate body id {:?}", body.id),
                });
            }
            if !(body.orbital_period_years.is_finite() && body.orbital_period_years > 0.0) {
                return Err(ConfigError::InvalidPeriod {
                    body: body.id.clone(),
                    period: body.orbital_period_years,
                });
            }
            validate_orb(&body.id, body.return_orb)?;
        }

        for id in &self.tracked_bodies {
            self.require_body(id)?;
        }

        for transit in &self.major_transits {
            self.require_body(&transit.body)?;
            validate_orb(&transit.name, transit.orb)?;
            if !transit.aspect_angle.is_finite() {
                return Err(ConfigError::InvalidFieldValue {
                    field: format!("{}.aspect_angle", transit.name),
                    message: "must be finite".to_string(),
                });
            }
            if !(transit.typical_age.is_finite() && transit.typical_age > 0.0) {
                return Err(ConfigError::InvalidFieldValue {
                    field: format!("{}.typical_age", transit.name),
                    message: format!("must be positive, got {}", transit.typical_age),
                });
            }
        }

        for stage in &self.life_stages {
            if !(stage.min_age < stage.max_age) {
                return Err(ConfigError::InvalidFieldValue {
                    field: format!("life stage {}", stage.name),
                    message: format!("min_age {} must be below max_age {}", stage.min_age, stage.max_age),
                });
            }
        }

        let progressed = &self.progressed_moon;
        validate_orb("progressed_moon", progressed.orb)?;
        if !(progressed.period_years.is_finite() && progressed.period_years > 0.0) {
            return Err(ConfigError::InvalidPeriod {
                body: "progressed_moon".to_string(),
                period: progressed.period_years,
            });
        }

        self.tiers.validate()?;
        if self.response_budget_bytes == 0 {
            return Err(ConfigError::InvalidBudget);
        }
        self.solver.validate()?;
        Ok(())
    }

    fn require_body(&self, id: &str) -> Result<&CelestialBody, ConfigError> {
        self.body(id).ok_or_else(|| ConfigError::UnknownBody {
            body: id.to_string(),
            known: self.body_ids(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_orb(subject: &str, orb: f64) -> Result<(), ConfigError> {
    if orb.is_finite() && orb >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidOrb {
            subject: subject.to_string(),
            orb,
        })
    }
}
