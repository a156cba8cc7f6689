pub mod budget;
pub mod calculator;
pub mod triage;
pub mod types;

pub use budget::{
    paginate, AspectPage, FixedSizeEstimator, JsonSizeEstimator, PaginationState, ResponseBudget,
    SizeEstimator,
};
pub use calculator::AspectCalculator;
pub use triage::{
    triage, AspectPriority, PriorityTier, TierThresholds, TriageSummary, TriagedAspects,
};
pub use types::{AspectCore, AspectObjectRef, AspectPair, AspectSet, AspectSettings};
