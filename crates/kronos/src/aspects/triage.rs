//! Orb-based priority tiers for a flat aspect list.
//!
//! Tiers have inclusive upper bounds: with the default thresholds an orb of
//! exactly 2.0° is tight. Anything wider than the loose bound is kept in an
//! `excluded` bucket so an explicit `all` request can still return it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::aspects::types::AspectPair;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub tight: f64,
    pub moderate: f64,
    pub loose: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            tight: 2.0,
            moderate: 5.0,
            loose: 8.0,
        }
    }
}

impl TierThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = self.tight.is_finite() && self.moderate.is_finite() && self.loose.is_finite();
        if finite && 0.0 < self.tight && self.tight < self.moderate && self.moderate < self.loose {
            Ok(())
        } else {
            Err(ConfigError::InvalidThresholds {
                tight: self.tight,
                moderate: self.moderate,
                loose: self.loose,
            })
        }
    }

    /// Tier for an orb magnitude, or None past the loose bound.
    pub fn classify(&self, orb: f64) -> Option<PriorityTier> {
        let orb = orb.abs();
        if orb <= self.tight {
            Some(PriorityTier::Tight)
        } else if orb <= self.moderate {
            Some(PriorityTier::Moderate)
        } else if orb <= self.loose {
            Some(PriorityTier::Loose)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Tight,
    Moderate,
    Loose,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 3] = [
        PriorityTier::Tight,
        PriorityTier::Moderate,
        PriorityTier::Loose,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityTier::Tight => "tight",
            PriorityTier::Moderate => "moderate",
            PriorityTier::Loose => "loose",
        }
    }

    /// 1-based page number of this tier.
    pub fn page(self) -> usize {
        self as usize + 1
    }

    /// This tier and every wider one.
    pub fn from_here(self) -> &'static [PriorityTier] {
        &Self::ALL[self as usize..]
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller asked for: a starting tier, or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectPriority {
    #[default]
    Tight,
    Moderate,
    Loose,
    All,
}

impl AspectPriority {
    pub fn tier(self) -> Option<PriorityTier> {
        match self {
            AspectPriority::Tight => Some(PriorityTier::Tight),
            AspectPriority::Moderate => Some(PriorityTier::Moderate),
            AspectPriority::Loose => Some(PriorityTier::Loose),
            AspectPriority::All => None,
        }
    }
}

impl From<PriorityTier> for AspectPriority {
    fn from(tier: PriorityTier) -> Self {
        match tier {
            PriorityTier::Tight => AspectPriority::Tight,
            PriorityTier::Moderate => AspectPriority::Moderate,
            PriorityTier::Loose => AspectPriority::Loose,
        }
    }
}

impl fmt::Display for AspectPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tier() {
            Some(tier) => tier.fmt(f),
            None => f.write_str("all"),
        }
    }
}

impl FromStr for AspectPriority {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tight" => Ok(AspectPriority::Tight),
            "moderate" => Ok(AspectPriority::Moderate),
            "loose" => Ok(AspectPriority::Loose),
            "all" => Ok(AspectPriority::All),
            other => Err(ConfigError::InvalidFieldValue {
                field: "aspect_priority".to_string(),
                message: format!("expected tight/moderate/loose/all, got {other:?}"),
            }),
        }
    }
}

/// Per-tier counts. `total` counts valid aspects only; rejected input is
/// reported on the side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TriageSummary {
    pub tight_aspects: usize,
    pub moderate_aspects: usize,
    pub loose_aspects: usize,
    pub excluded_aspects: usize,
    pub total_aspects: usize,
    pub rejected_self_aspects: usize,
    pub rejected_invalid_orbs: usize,
}

impl TriageSummary {
    pub fn count(&self, tier: PriorityTier) -> usize {
        match tier {
            PriorityTier::Tight => self.tight_aspects,
            PriorityTier::Moderate => self.moderate_aspects,
            PriorityTier::Loose => self.loose_aspects,
        }
    }
}

/// Aspects split by tier, each tier in canonical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriagedAspects {
    pub tight: Vec<AspectPair>,
    pub moderate: Vec<AspectPair>,
    pub loose: Vec<AspectPair>,
    pub excluded: Vec<AspectPair>,
    pub summary: TriageSummary,
}

impl TriagedAspects {
    pub fn tier(&self, tier: PriorityTier) -> &[AspectPair] {
        match tier {
            PriorityTier::Tight => &self.tight,
            PriorityTier::Moderate => &self.moderate,
            PriorityTier::Loose => &self.loose,
        }
    }

    /// A single tier, or every valid aspect (excluded ones last) for `All`.
    pub fn select(&self, priority: AspectPriority) -> Vec<&AspectPair> {
        match priority.tier() {
            Some(tier) => self.tier(tier).iter().collect(),
            None => self
                .tight
                .iter()
                .chain(&self.moderate)
                .chain(&self.loose)
                .chain(&self.excluded)
                .collect(),
        }
    }

    /// Non-empty tiers, in priority order.
    pub fn non_empty_tiers(&self) -> Vec<PriorityTier> {
        PriorityTier::ALL
            .into_iter()
            .filter(|t| !self.tier(*t).is_empty())
            .collect()
    }
}

/// Total order used inside a tier: orb, then the pair identity.
pub fn canonical_order(a: &AspectPair, b: &AspectPair) -> Ordering {
    a.aspect
        .orb
        .abs()
        .total_cmp(&b.aspect.orb.abs())
        .then_with(|| a.from.object_id.cmp(&b.from.object_id))
        .then_with(|| a.to.object_id.cmp(&b.to.object_id))
        .then_with(|| a.aspect.aspect_type.cmp(&b.aspect.aspect_type))
        .then_with(|| a.from.layer_id.cmp(&b.from.layer_id))
        .then_with(|| a.to.layer_id.cmp(&b.to.layer_id))
        .then_with(|| a.from.object_type.cmp(&b.from.object_type))
        .then_with(|| a.to.object_type.cmp(&b.to.object_type))
        .then_with(|| a.aspect.is_applying.cmp(&b.aspect.is_applying))
}

/// Partition `aspects` into tiers.
///
/// Self-aspects and non-finite orbs are dropped and counted. The output does
/// not depend on input order.
pub fn triage(aspects: &[AspectPair], thresholds: &TierThresholds) -> TriagedAspects {
    let mut out = TriagedAspects::default();

    for aspect in aspects {
        if aspect.is_self_aspect() {
            out.summary.rejected_self_aspects += 1;
            continue;
        }
        if !aspect.aspect.orb.is_finite() {
            out.summary.rejected_invalid_orbs += 1;
            continue;
        }
        let bucket = match thresholds.classify(aspect.aspect.orb) {
            Some(PriorityTier::Tight) => &mut out.tight,
            Some(PriorityTier::Moderate) => &mut out.moderate,
            Some(PriorityTier::Loose) => &mut out.loose,
            None => &mut out.excluded,
        };
        bucket.push(aspect.clone());
    }

    for bucket in [
        &mut out.tight,
        &mut out.moderate,
        &mut out.loose,
        &mut out.excluded,
    ] {
        bucket.sort_by(canonical_order);
    }

    let rejected = out.summary.rejected_self_aspects + out.summary.rejected_invalid_orbs;
    if rejected > 0 {
        log::debug!("Triage dropped {rejected} invalid aspect(s)");
    }

    out.summary.tight_aspects = out.tight.len();
    out.summary.moderate_aspects = out.moderate.len();
    out.summary.loose_aspects = out.loose.len();
    out.summary.excluded_aspects = out.excluded.len();
    out.summary.total_aspects = out.tight.len() + out.moderate.len() + out.loose.len() + out.excluded.len();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        let t = TierThresholds::default();
        assert_eq!(t.classify(2.0), Some(PriorityTier::Tight));
        assert_eq!(t.classify(-2.0), Some(PriorityTier::Tight));
        assert_eq!(t.classify(5.0), Some(PriorityTier::Moderate));
        assert_eq!(t.classify(8.0), Some(PriorityTier::Loose));
        assert_eq!(t.classify(8.01), None);
    }

    #[test]
    fn test_thresholds_must_ascend() {
        let bad = TierThresholds {
            tight: 5.0,
            moderate: 2.0,
            loose: 8.0,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_tier_pages() {
        assert_eq!(PriorityTier::Tight.page(), 1);
        assert_eq!(PriorityTier::Loose.page(), 3);
        assert_eq!(PriorityTier::Moderate.from_here().len(), 2);
    }
}
