//! Fit tiered aspects into a serialized-size budget.
//!
//! Tiers are added in priority order starting from the requested one, as a
//! contiguous run, for as long as the estimated payload stays within budget.
//! The first tier is always returned, flagged when it alone is too large.

use serde::Serialize;

use crate::aspects::triage::{AspectPriority, PriorityTier, TriageSummary, TriagedAspects};
use crate::aspects::types::AspectPair;
use crate::config::Config;

/// Estimated encoded size of one aspect.
pub trait SizeEstimator {
    fn aspect_bytes(&self, aspect: &AspectPair) -> usize;
}

/// Compact JSON length plus one separator byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSizeEstimator;

impl SizeEstimator for JsonSizeEstimator {
    fn aspect_bytes(&self, aspect: &AspectPair) -> usize {
        serde_json::to_vec(aspect).map_or(0, |bytes| bytes.len()) + 1
    }
}

/// Fixed per-aspect size; handy for tests and for callers with their own encoding.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizeEstimator(pub usize);

impl SizeEstimator for FixedSizeEstimator {
    fn aspect_bytes(&self, _aspect: &AspectPair) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseBudget {
    pub budget_bytes: usize,
    /// Reserved for summary and pagination around the items
    pub envelope_bytes: usize,
}

impl ResponseBudget {
    pub fn from_config(config: &Config) -> Self {
        Self {
            budget_bytes: config.response_budget_bytes,
            envelope_bytes: config.envelope_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub current_tier: AspectPriority,
    /// Page of the requested tier; None for `all`
    pub current_page: Option<usize>,
    pub included_tiers: Vec<PriorityTier>,
    /// Non-empty tiers after the last included one
    pub remaining_tiers: Vec<PriorityTier>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<PriorityTier>,
    /// Number of non-empty tiers
    pub total_pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectPage {
    pub aspects: Vec<AspectPair>,
    pub summary: TriageSummary,
    pub returned_in_this_page: usize,
    pub pagination: PaginationState,
    pub estimated_bytes: usize,
    pub over_budget: bool,
}

/// Build one page of `triaged` for `priority` within `budget`.
pub fn paginate(
    triaged: &TriagedAspects,
    priority: AspectPriority,
    budget: &ResponseBudget,
    estimator: &dyn SizeEstimator,
) -> AspectPage {
    let size_of = |items: &[AspectPair]| -> usize {
        items.iter().map(|a| estimator.aspect_bytes(a)).sum()
    };
    let total_pages = triaged.non_empty_tiers().len();

    let Some(start) = priority.tier() else {
        let aspects: Vec<AspectPair> = triaged.select(AspectPriority::All).into_iter().cloned().collect();
        let estimated_bytes = budget.envelope_bytes + size_of(&aspects);
        let over_budget = estimated_bytes > budget.budget_bytes;
        if over_budget {
            log::warn!(
                "Full aspect listing is ~{estimated_bytes} bytes, over the {} byte budget",
                budget.budget_bytes
            );
        }
        return AspectPage {
            returned_in_this_page: aspects.len(),
            aspects,
            summary: triaged.summary,
            pagination: PaginationState {
                current_tier: AspectPriority::All,
                current_page: None,
                included_tiers: PriorityTier::ALL.to_vec(),
                remaining_tiers: Vec::new(),
                has_more: false,
                next_tier: None,
                total_pages,
                instructions: None,
            },
            estimated_bytes,
            over_budget,
        };
    };

    let mut estimated_bytes = budget.envelope_bytes;
    let mut included = Vec::new();
    let mut over_budget = false;
    for &tier in start.from_here() {
        let tier_bytes = size_of(triaged.tier(tier));
        let fits = estimated_bytes + tier_bytes <= budget.budget_bytes;
        if included.is_empty() {
            if !fits {
                over_budget = true;
                log::warn!(
                    "{} tier alone is ~{} bytes, over the {} byte budget; returning it anyway",
                    tier,
                    estimated_bytes + tier_bytes,
                    budget.budget_bytes
                );
            }
        } else if !fits {
            break;
        }
        estimated_bytes += tier_bytes;
        included.push(tier);
    }

    let last = included.last().copied().unwrap_or(start);
    let remaining_tiers: Vec<PriorityTier> = triaged
        .non_empty_tiers()
        .into_iter()
        .filter(|t| *t > last)
        .collect();
    let next_tier = remaining_tiers.first().copied();

    let aspects: Vec<AspectPair> = included
        .iter()
        .flat_map(|t| triaged.tier(*t).iter().cloned())
        .collect();

    AspectPage {
        returned_in_this_page: aspects.len(),
        aspects,
        summary: triaged.summary,
        pagination: PaginationState {
            current_tier: priority,
            current_page: Some(start.page()),
            included_tiers: included,
            has_more: next_tier.is_some(),
            next_tier,
            remaining_tiers,
            total_pages,
            instructions: next_tier.map(|t| {
                format!("To get {t} aspects, call again with aspect_priority='{t}'")
            }),
        },
        estimated_bytes,
        over_budget,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_pages() {
        let page = paginate(
            &TriagedAspects::default(),
            AspectPriority::Tight,
            &ResponseBudget {
                budget_bytes: 100,
                envelope_bytes: 10,
            },
            &FixedSizeEstimator(10),
        );
        assert!(page.aspects.is_empty());
        assert!(!page.pagination.has_more);
        assert_eq!(page.pagination.total_pages, 0);
        assert!(!page.over_budget);
    }
}
