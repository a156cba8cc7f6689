//! Cycle numbering and significance lookup.
//!
//! Everything here is table driven: the classifier only turns an age into a
//! cycle marker, the configured tables decide what that marker means.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{CelestialBody, Config};
use crate::error::ConfigError;

/// Coarse importance of a lifecycle event. Ordered most important first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Significance {
    Critical,
    High,
    Moderate,
    Low,
}

impl Significance {
    pub fn is_major(self) -> bool {
        matches!(self, Significance::Critical | Significance::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Significance::Critical => "CRITICAL",
            Significance::High => "HIGH",
            Significance::Moderate => "MODERATE",
            Significance::Low => "LOW",
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Significance {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Significance::Critical),
            "high" => Ok(Significance::High),
            "moderate" => Ok(Significance::Moderate),
            "low" => Ok(Significance::Low),
            other => Err(ConfigError::InvalidFieldValue {
                field: "significance".to_string(),
                message: format!("expected critical/high/moderate/low, got {other:?}"),
            }),
        }
    }
}

impl TryFrom<String> for Significance {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where in a body's cycle an event sits.
///
/// `Return(n)` is the n-th return to the natal degree; `Square` and
/// `Opposition` mark the fractional phases used by major transits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CycleMarker {
    Return(u32),
    Square,
    Opposition,
}

impl fmt::Display for CycleMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleMarker::Return(n) => write!(f, "{n}"),
            CycleMarker::Square => f.write_str("square"),
            CycleMarker::Opposition => f.write_str("opposition"),
        }
    }
}

impl FromStr for CycleMarker {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "square" => Ok(CycleMarker::Square),
            "opposition" => Ok(CycleMarker::Opposition),
            digits => match digits.parse::<u32>() {
                Ok(n) if n >= 1 => Ok(CycleMarker::Return(n)),
                _ => Err(ConfigError::InvalidFieldValue {
                    field: "cycle marker".to_string(),
                    message: format!("expected a return number >= 1, \"square\" or \"opposition\", got {s:?}"),
                }),
            },
        }
    }
}

impl TryFrom<String> for CycleMarker {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CycleMarker> for String {
    fn from(marker: CycleMarker) -> Self {
        marker.to_string()
    }
}

/// Current cycle, 1-indexed: `floor(age / period) + 1`.
///
/// Negative ages are clamped to zero, so the result is always >= 1 and
/// never decreases as age grows.
pub fn cycle_number(age_years: f64, period_years: f64) -> u32 {
    let completed = (age_years.max(0.0) / period_years).floor();
    if completed.is_finite() {
        (completed as u32).saturating_add(1)
    } else {
        1
    }
}

/// Ordinal of the occurrence whose natural age is closest to `age_years`.
///
/// Occurrence `k` naturally falls at `first_age + (k - 1) * period`. Used to
/// number an event that is active right now: at age 29.84 with a 29.46-year
/// period the active return is the first one, even though the second cycle
/// has technically begun.
pub fn nearest_occurrence(age_years: f64, first_age: f64, period_years: f64) -> u32 {
    let k = ((age_years - first_age) / period_years).round() + 1.0;
    if k.is_finite() && k >= 1.0 {
        k as u32
    } else {
        1
    }
}

/// Natural age of occurrence `k` (1-indexed).
pub fn occurrence_age(k: u32, first_age: f64, period_years: f64) -> f64 {
    first_age + f64::from(k.saturating_sub(1)) * period_years
}

/// Significance, keywords and interpretation for one body at one marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleClassification {
    pub body: String,
    pub marker: CycleMarker,
    pub significance: Significance,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

/// Lookups against the configured tables.
pub struct CycleClassifier<'a> {
    config: &'a Config,
}

impl<'a> CycleClassifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Significance for `marker`, falling back to the body default, and to
    /// MODERATE for bodies the configuration doesn't know.
    pub fn significance(&self, body: &str, marker: CycleMarker) -> Significance {
        match self.config.body(body) {
            Some(b) => b
                .significance
                .by_marker
                .get(&marker)
                .copied()
                .unwrap_or(b.significance.default),
            None => Significance::Moderate,
        }
    }

    /// Keywords attached to a body at a given tier.
    pub fn keywords(&self, body: &str, tier: Significance) -> Vec<String> {
        self.config
            .body(body)
            .map(|b| keywords_for(b, tier).to_vec())
            .unwrap_or_default()
    }

    pub fn interpretation(&self, body: &str, marker: CycleMarker) -> Option<String> {
        let b = self.config.body(body)?;
        b.interpretations
            .get(&marker)
            .or(b.default_interpretation.as_ref())
            .cloned()
    }

    /// Full classification of the return in progress at `age_years`.
    pub fn classify_return(&self, body: &CelestialBody, age_years: f64) -> CycleClassification {
        let n = cycle_number(age_years, body.orbital_period_years);
        self.classify(&body.id, CycleMarker::Return(n))
    }

    pub fn classify(&self, body: &str, marker: CycleMarker) -> CycleClassification {
        let significance = self.significance(body, marker);
        CycleClassification {
            body: body.to_string(),
            marker,
            significance,
            keywords: self.keywords(body, significance),
            interpretation: self.interpretation(body, marker),
        }
    }
}

fn keywords_for(body: &CelestialBody, tier: Significance) -> &[String] {
    body.keywords
        .by_tier
        .get(&tier)
        .unwrap_or(&body.keywords.base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_parsing() {
        assert_eq!("1".parse::<CycleMarker>().unwrap(), CycleMarker::Return(1));
        assert_eq!(" Opposition ".parse::<CycleMarker>().unwrap(), CycleMarker::Opposition);
        assert!("0".parse::<CycleMarker>().is_err());
        assert!("0.5".parse::<CycleMarker>().is_err());
    }

    #[test]
    fn test_nearest_occurrence() {
        assert_eq!(nearest_occurrence(29.84, 29.46, 29.46), 1);
        assert_eq!(nearest_occurrence(58.0, 29.46, 29.46), 2);
        assert_eq!(nearest_occurrence(1.0, 29.46, 29.46), 1);
        assert_eq!(nearest_occurrence(41.2, 41.0, 83.75), 1);
    }

    #[test]
    fn test_significance_order() {
        let mut tiers = vec![Significance::Low, Significance::Critical, Significance::Moderate];
        tiers.sort();
        assert_eq!(tiers[0], Significance::Critical);
        assert!(Significance::High.is_major());
        assert!(!Significance::Moderate.is_major());
    }
}
