//! Built-in lifecycle tables: periods, orbs, significance, keywords,
//! interpretations, major transits and life-stage bands.

use std::collections::HashMap;

use super::{
    CelestialBody, Config, KeywordTable, LifeStage, MajorTransit, ProgressedMoonSettings,
    SignificanceTable, TimelineSettings,
};
use crate::aspects::triage::TierThresholds;
use crate::cycles::{CycleMarker, Significance};
use crate::solver::SolverSettings;

use CycleMarker::{Opposition, Return, Square};
use Significance::{Critical, High, Low, Moderate};

/// 50 KiB, the transport's per-message ceiling
pub const DEFAULT_RESPONSE_BUDGET_BYTES: usize = 50 * 1024;
pub const DEFAULT_ENVELOPE_BYTES: usize = 1024;

// (id, name, period years, return orb, retrograde mean motion, default significance)
const BODIES: &[(&str, &str, f64, f64, bool, Significance)] = &[
    ("sun", "Sun", 1.0, 0.5, false, Moderate),
    ("moon", "Moon", 0.0747, 2.0, false, Low),
    ("mercury", "Mercury", 0.24, 1.0, false, Low),
    ("venus", "Venus", 0.615, 1.0, false, Low),
    ("mars", "Mars", 1.88, 1.0, false, Moderate),
    ("jupiter", "Jupiter", 11.86, 2.0, false, Moderate),
    ("saturn", "Saturn", 29.46, 1.5, false, High),
    ("uranus", "Uranus", 83.75, 1.5, false, Moderate),
    ("neptune", "Neptune", 164.79, 1.5, false, Moderate),
    ("pluto", "Pluto", 247.94, 1.5, false, Moderate),
    ("chiron", "Chiron", 50.67, 1.0, false, Moderate),
    ("north_node", "North Node", 18.6, 1.0, true, Moderate),
    ("south_node", "South Node", 18.6, 1.0, true, Moderate),
];

const SIGNIFICANCE: &[(&str, CycleMarker, Significance)] = &[
    ("jupiter", Return(1), High),
    ("jupiter", Return(2), High),
    ("jupiter", Return(3), High),
    ("jupiter", Return(4), High),
    ("saturn", Return(1), Critical),
    ("saturn", Return(2), Critical),
    ("saturn", Return(3), Critical),
    ("uranus", Opposition, Critical),
    ("uranus", Return(1), Critical),
    ("neptune", Square, Critical),
    ("pluto", Square, Critical),
    ("pluto", Return(1), Critical),
    ("chiron", Opposition, High),
    ("chiron", Return(1), High),
    ("north_node", Return(1), High),
    ("north_node", Return(2), High),
    ("north_node", Return(3), High),
];

const KEYWORDS: &[(&str, &[&str])] = &[
    ("sun", &["identity", "vitality", "new year", "birthday", "self-expression"]),
    ("moon", &["emotions", "instincts", "cycles", "home", "nurturing"]),
    ("mercury", &["communication", "learning", "connections", "commerce"]),
    ("venus", &["love", "values", "beauty", "harmony", "pleasure"]),
    ("mars", &["action", "energy", "desire", "courage", "assertion"]),
    ("jupiter", &["luck", "expansion", "belief", "wisdom", "opportunity", "growth"]),
    ("saturn", &["maturity", "responsibility", "karma", "restructuring", "mastery", "limits"]),
    ("uranus", &["freedom", "rebellion", "innovation", "awakening", "revolution", "change"]),
    ("neptune", &["spirituality", "dreams", "illusion", "surrender", "transcendence", "compassion"]),
    ("pluto", &["transformation", "power", "death/rebirth", "depths", "regeneration", "intensity"]),
    ("chiron", &["healing", "wounds", "wisdom", "wholeness", "teacher", "wounded healer"]),
    ("north_node", &["soul growth", "destiny", "evolution", "purpose", "future direction"]),
    ("south_node", &["past patterns", "release", "karma", "comfort zone", "letting go"]),
];

// Tier-specific keyword sets; bodies without an entry use their base list
const TIER_KEYWORDS: &[(&str, Significance, &[&str])] = &[
    ("saturn", Critical, &["maturity", "accountability", "restructuring", "karmic reckoning", "mastery"]),
    ("jupiter", High, &["coming of age", "expansion", "belief", "opportunity", "growth"]),
];

// None = the body's default interpretation
const INTERPRETATIONS: &[(&str, Option<CycleMarker>, &str)] = &[
    ("saturn", Some(Return(1)), "First major Saturn Return: maturation, accountability, and restructuring."),
    ("saturn", Some(Return(2)), "Second Saturn Return: elder mastery, legacy review, and completion of long cycles."),
    ("saturn", Some(Return(3)), "Third Saturn Return: wisdom keeper threshold and preparation for spiritual legacy."),
    ("saturn", None, "Saturnian restructuring phase demanding responsibility and integrity."),
    ("chiron", Some(Return(1)), "Chiron Return: integration of the wounded healer archetype at midlife."),
    ("chiron", Some(Opposition), "Chiron Opposition: awakening to core wounds and the medicine you carry."),
    ("chiron", None, "Chiron cycle emphasizing healing, wholeness, and mentorship."),
    ("jupiter", Some(Return(1)), "First Jupiter Return: rite of passage expanding belief systems and opportunities."),
    ("jupiter", Some(Return(2)), "Second Jupiter Return: new growth cycle in adulthood and renewed optimism."),
    ("jupiter", None, "Jupiter expansion phase bringing fresh wisdom, abundance, and faith."),
    ("mars", None, "Mars Return: reboot of motivation, courage, and how you assert your will."),
    ("north_node", Some(Return(1)), "First Nodal Return: alignment with soul mission and destiny pivot."),
    ("north_node", Some(Return(2)), "Second Nodal Return: recalibration of karmic path and life direction."),
    ("north_node", None, "Nodal Return: reminders to lean into your evolutionary edge."),
    ("uranus", Some(Opposition), "Uranus Opposition: midlife awakening demanding authentic freedom."),
    ("uranus", Some(Return(1)), "Uranus Return: revolutionary reinvention of identity and destiny."),
    ("uranus", None, "Uranian cycle prompting liberation and innovation."),
    ("neptune", Some(Square), "Neptune Square: fog versus faith, reshaping the spiritual compass."),
    ("neptune", None, "Neptunian cycle encouraging surrender, compassion, and imagination."),
    ("pluto", Some(Square), "Pluto Square: deep alchemical transformation of power dynamics."),
    ("pluto", None, "Plutonian metamorphosis requiring total honesty and regeneration."),
];

const TRACKED_BODIES: &[&str] = &[
    "mars",
    "jupiter",
    "saturn",
    "chiron",
    "north_node",
    "uranus",
    "neptune",
    "pluto",
];

// (name, body, aspect angle, marker, orb, typical age, age range, keywords, description)
type TransitRow = (
    &'static str,
    &'static str,
    f64,
    CycleMarker,
    f64,
    f64,
    (f64, f64),
    &'static [&'static str],
    &'static str,
);

const MAJOR_TRANSITS: &[TransitRow] = &[
    (
        "Uranus Opposition",
        "uranus",
        180.0,
        Opposition,
        3.0,
        41.0,
        (40.0, 43.0),
        &["midlife", "freedom", "awakening", "revolution", "liberation", "authenticity"],
        "Uranus opposes natal Uranus. A powerful awakening to personal freedom and authentic self-expression.",
    ),
    (
        "Neptune Square",
        "neptune",
        90.0,
        Square,
        2.5,
        39.0,
        (38.0, 41.0),
        &["spirituality", "confusion", "faith", "illusion", "surrender", "compassion"],
        "Neptune squares natal Neptune. Confrontation with illusion versus reality, requiring faith and surrender.",
    ),
    (
        "Pluto Square",
        "pluto",
        90.0,
        Square,
        2.5,
        36.0,
        (35.0, 38.0),
        &["transformation", "power", "crisis", "rebirth", "intensity", "depth"],
        "Pluto squares natal Pluto. Deep personal transformation and power recalibration.",
    ),
    (
        "Chiron Opposition",
        "chiron",
        180.0,
        Opposition,
        3.0,
        25.0,
        (24.0, 27.0),
        &["healing", "vulnerability", "medicine person", "wisdom", "teacher", "wounds"],
        "Chiron opposes natal Chiron. First major wound healing crisis and emergence as teacher.",
    ),
];

// (name, description, min age, max age, themes)
const LIFE_STAGES: &[(&str, &str, f64, f64, &[&str])] = &[
    ("Childhood", "Foundation building and early development", 0.0, 12.0, &["learning", "growth", "discovery"]),
    ("First Jupiter Return & Adolescence", "Expansion of identity and coming of age", 12.0, 18.0, &["identity", "independence", "exploration"]),
    ("Early Adulthood", "Independence and self-discovery", 18.0, 25.0, &["freedom", "experimentation", "relationships"]),
    ("Chiron Opposition Period", "First major wound healing crisis", 25.0, 29.0, &["healing", "vulnerability", "teaching"]),
    ("Saturn Return", "Karmic maturation and life restructuring", 29.0, 31.0, &["responsibility", "maturity", "commitment"]),
    ("Post-Saturn Return", "Building authentic path", 31.0, 36.0, &["clarity", "purpose", "manifestation"]),
    ("Pluto Square", "Deep transformation and power recalibration", 36.0, 38.0, &["transformation", "power", "rebirth"]),
    ("Neptune Square", "Spiritual crisis or awakening", 38.0, 41.0, &["spirituality", "faith", "illusion"]),
    ("Uranus Opposition", "Midlife awakening and liberation", 41.0, 43.0, &["freedom", "authenticity", "revolution"]),
    ("Mature Adulthood", "Integration of wisdom", 43.0, 50.0, &["mastery", "teaching", "legacy"]),
    ("Chiron Return Period", "Emergence as wounded healer", 50.0, 58.0, &["healing", "wisdom", "service"]),
    ("Second Saturn Return", "Elder wisdom and life review", 58.0, 60.0, &["wisdom", "legacy", "completion"]),
    ("Elder Years", "Wisdom sharing and legacy building", 60.0, 120.0, &["teaching", "legacy", "integration"]),
];

const PROGRESSED_MOON_ORB: f64 = 2.0;
const PROGRESSED_MOON_PERIOD_YEARS: f64 = 27.321661;
const PROGRESSED_MOON_KEYWORDS: &[&str] = &[
    "emotional reset",
    "intuition",
    "inner rhythm",
    "soul nourishment",
    "sensitivity",
];
const PROGRESSED_MOON_INTERPRETATION: &str =
    "Progressed Moon Return: an emotional reset that reboots intuition, needs and inner rhythm.";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn build_body(
    &(id, name, period, orb, retrograde, default): &(&str, &str, f64, f64, bool, Significance),
) -> CelestialBody {
    let by_marker = SIGNIFICANCE
        .iter()
        .filter(|(body, _, _)| *body == id)
        .map(|&(_, marker, tier)| (marker, tier))
        .collect();

    let base = KEYWORDS
        .iter()
        .find(|(body, _)| *body == id)
        .map(|(_, words)| strings(words))
        .unwrap_or_default();
    let by_tier = TIER_KEYWORDS
        .iter()
        .filter(|(body, _, _)| *body == id)
        .map(|&(_, tier, words)| (tier, strings(words)))
        .collect();

    let mut interpretations = HashMap::new();
    let mut default_interpretation = None;
    for &(body, marker, text) in INTERPRETATIONS.iter().filter(|(body, _, _)| *body == id) {
        debug_assert_eq!(body, id);
        match marker {
            Some(m) => {
                interpretations.insert(m, text.to_string());
            }
            None => default_interpretation = Some(text.to_string()),
        }
    }

    CelestialBody {
        id: id.to_string(),
        name: name.to_string(),
        orbital_period_years: period,
        return_orb: orb,
        mean_motion_retrograde: retrograde,
        significance: SignificanceTable { default, by_marker },
        keywords: KeywordTable { base, by_tier },
        interpretations,
        default_interpretation,
    }
}

fn build_transit(
    &(name, body, angle, marker, orb, typical_age, age_range, keywords, description): &TransitRow,
) -> MajorTransit {
    MajorTransit {
        name: name.to_string(),
        body: body.to_string(),
        aspect_angle: angle,
        marker,
        orb,
        typical_age,
        age_range,
        keywords: strings(keywords),
        description: description.to_string(),
    }
}

fn build_config() -> Config {
    Config {
        bodies: BODIES.iter().map(build_body).collect(),
        tracked_bodies: strings(TRACKED_BODIES),
        major_transits: MAJOR_TRANSITS.iter().map(build_transit).collect(),
        life_stages: LIFE_STAGES
            .iter()
            .map(|&(name, description, min_age, max_age, themes)| LifeStage {
                name: name.to_string(),
                description: description.to_string(),
                min_age,
                max_age,
                themes: strings(themes),
            })
            .collect(),
        tiers: TierThresholds::default(),
        response_budget_bytes: DEFAULT_RESPONSE_BUDGET_BYTES,
        envelope_bytes: DEFAULT_ENVELOPE_BYTES,
        solver: SolverSettings::default(),
        timeline: TimelineSettings::default(),
        progressed_moon: ProgressedMoonSettings {
            orb: PROGRESSED_MOON_ORB,
            period_years: PROGRESSED_MOON_PERIOD_YEARS,
            significance: High,
            keywords: strings(PROGRESSED_MOON_KEYWORDS),
            interpretation: PROGRESSED_MOON_INTERPRETATION.to_string(),
        },
    }
}

lazy_static::lazy_static! {
    /// Built-in configuration. Immutable; `Config::builtin()` hands out clones.
    pub static ref BUILTIN_CONFIG: Config = build_config();
}
