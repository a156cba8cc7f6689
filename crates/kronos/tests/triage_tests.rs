use kronos::aspects::{
    paginate, triage, AspectCore, AspectObjectRef, AspectPair, AspectPriority, FixedSizeEstimator,
    JsonSizeEstimator, PriorityTier, ResponseBudget, SizeEstimator, TierThresholds,
};
use kronos::Config;
use proptest::prelude::*;

fn aspect(from: &str, to: &str, orb: f64) -> AspectPair {
    AspectPair {
        from: AspectObjectRef::planet("transit", from),
        to: AspectObjectRef::planet("natal", to),
        aspect: AspectCore {
            aspect_type: "square".to_string(),
            exact_angle: 90.0,
            orb,
            is_applying: true,
            is_exact: orb < 0.1,
            is_retrograde: false,
        },
    }
}

/// 2 tight, 16 moderate, 44 loose.
fn sixty_two() -> Vec<AspectPair> {
    let mut out = Vec::new();
    for (i, orb) in [0.4, 2.0].iter().enumerate() {
        out.push(aspect(&format!("t{i}"), &format!("n{i}"), *orb));
    }
    for i in 0..16 {
        out.push(aspect(&format!("m{i}"), "natal_sun", 2.1 + 0.18 * i as f64));
    }
    for i in 0..44 {
        out.push(aspect(&format!("l{i}"), "natal_moon", 5.05 + 0.068 * i as f64));
    }
    out
}

fn budget(bytes: usize) -> ResponseBudget {
    ResponseBudget {
        budget_bytes: bytes,
        envelope_bytes: 0,
    }
}

#[test]
fn test_sixty_two_aspect_partition() {
    let triaged = triage(&sixty_two(), &TierThresholds::default());
    assert_eq!(triaged.summary.tight_aspects, 2);
    assert_eq!(triaged.summary.moderate_aspects, 16);
    assert_eq!(triaged.summary.loose_aspects, 44);
    assert_eq!(triaged.summary.excluded_aspects, 0);
    assert_eq!(triaged.summary.total_aspects, 62);
}

#[test]
fn test_orb_of_exactly_two_is_tight() {
    let triaged = triage(&[aspect("mars", "venus", 2.0)], &TierThresholds::default());
    assert_eq!(triaged.tight.len(), 1);
    assert!(triaged.moderate.is_empty());
}

#[test]
fn test_invalid_aspects_are_rejected_and_counted() {
    let input = vec![
        aspect("sun", "sun", 0.5),
        aspect("moon", "mars", f64::NAN),
        aspect("moon", "venus", 1.0),
        aspect("moon", "pluto", 11.0),
    ];
    let triaged = triage(&input, &TierThresholds::default());
    assert_eq!(triaged.summary.rejected_self_aspects, 1);
    assert_eq!(triaged.summary.rejected_invalid_orbs, 1);
    assert_eq!(triaged.summary.total_aspects, 2);
    assert_eq!(triaged.excluded.len(), 1);
    assert_eq!(triaged.select(AspectPriority::All).len(), 2);
    assert_eq!(triaged.select(AspectPriority::Tight).len(), 1);
}

#[test]
fn test_order_is_independent_of_input_order() {
    let forward = sixty_two();
    let mut reversed = forward.clone();
    reversed.reverse();
    let a = triage(&forward, &TierThresholds::default());
    let b = triage(&reversed, &TierThresholds::default());
    assert_eq!(a, b);
    assert!(a
        .loose
        .windows(2)
        .all(|w| w[0].aspect.orb <= w[1].aspect.orb));
}

#[test]
fn test_ties_break_on_pair_identity() {
    let input = vec![aspect("venus", "sun", 1.0), aspect("mars", "sun", 1.0)];
    let triaged = triage(&input, &TierThresholds::default());
    assert_eq!(triaged.tight[0].from.object_id, "mars");
    assert_eq!(triaged.tight[1].from.object_id, "venus");
}

#[test]
fn test_first_page_stops_before_overflowing_tier() {
    let triaged = triage(&sixty_two(), &TierThresholds::default());
    let page = paginate(&triaged, AspectPriority::Tight, &budget(250), &FixedSizeEstimator(100));

    assert_eq!(page.aspects.len(), 2);
    assert!(!page.over_budget);
    assert_eq!(page.estimated_bytes, 200);
    assert_eq!(page.pagination.included_tiers, vec![PriorityTier::Tight]);
    assert_eq!(
        page.pagination.remaining_tiers,
        vec![PriorityTier::Moderate, PriorityTier::Loose]
    );
    assert!(page.pagination.has_more);
    assert_eq!(page.pagination.next_tier, Some(PriorityTier::Moderate));
    assert_eq!(page.pagination.current_page, Some(1));
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page
        .pagination
        .instructions
        .as_deref()
        .unwrap()
        .contains("aspect_priority='moderate'"));
    assert_eq!(page.summary.total_aspects, 62);
}

#[test]
fn test_generous_budget_returns_everything() {
    let triaged = triage(&sixty_two(), &TierThresholds::default());
    let page = paginate(&triaged, AspectPriority::Tight, &budget(1_000_000), &FixedSizeEstimator(100));

    assert_eq!(page.aspects.len(), 62);
    assert_eq!(page.pagination.included_tiers, PriorityTier::ALL.to_vec());
    assert!(!page.pagination.has_more);
    assert_eq!(page.pagination.next_tier, None);
    assert!(page.pagination.instructions.is_none());
}

#[test]
fn test_oversized_first_tier_is_returned_and_flagged() {
    let triaged = triage(&sixty_two(), &TierThresholds::default());
    let page = paginate(&triaged, AspectPriority::Tight, &budget(150), &FixedSizeEstimator(100));

    assert_eq!(page.aspects.len(), 2);
    assert!(page.over_budget);
    assert_eq!(page.pagination.next_tier, Some(PriorityTier::Moderate));
}

#[test]
fn test_starting_from_a_later_tier() {
    let triaged = triage(&sixty_two(), &TierThresholds::default());
    let page = paginate(&triaged, AspectPriority::Moderate, &budget(2_000), &FixedSizeEstimator(100));

    assert_eq!(page.aspects.len(), 16);
    assert_eq!(page.pagination.current_tier, AspectPriority::Moderate);
    assert_eq!(page.pagination.current_page, Some(2));
    assert_eq!(page.pagination.next_tier, Some(PriorityTier::Loose));
}

#[test]
fn test_empty_tiers_are_skipped_in_pagination() {
    let input = vec![aspect("sun", "mars", 1.0), aspect("moon", "mars", 7.0)];
    let triaged = triage(&input, &TierThresholds::default());
    let page = paginate(&triaged, AspectPriority::Tight, &budget(150), &FixedSizeEstimator(100));

    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.pagination.next_tier, Some(PriorityTier::Loose));
    assert_eq!(page.pagination.remaining_tiers, vec![PriorityTier::Loose]);
}

#[test]
fn test_all_request_has_no_pagination() {
    let mut input = sixty_two();
    input.push(aspect("x", "y", 9.5));
    let triaged = triage(&input, &TierThresholds::default());
    let page = paginate(&triaged, AspectPriority::All, &budget(100), &FixedSizeEstimator(10));

    assert_eq!(page.aspects.len(), 63);
    assert!(!page.pagination.has_more);
    assert_eq!(page.pagination.current_page, None);
    assert!(page.over_budget);
}

#[test]
fn test_json_estimator_matches_encoding() {
    let a = aspect("mars", "venus", 1.25);
    let encoded = serde_json::to_vec(&a).unwrap();
    assert_eq!(JsonSizeEstimator.aspect_bytes(&a), encoded.len() + 1);
}

#[test]
fn test_default_budget_fits_sixty_two_aspects() {
    let config = Config::builtin();
    let page = kronos::paginate_aspects(&config, &sixty_two(), AspectPriority::Tight);
    assert_eq!(page.aspects.len(), 62);
    assert!(page.estimated_bytes <= config.response_budget_bytes);
}

fn arb_aspects() -> impl Strategy<Value = Vec<AspectPair>> {
    prop::collection::vec((0usize..6, 0usize..6, 0.0f64..12.0), 0..80).prop_map(|rows| {
        rows.into_iter()
            .map(|(a, b, orb)| aspect(&format!("b{a}"), &format!("b{b}"), orb))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_partition_law(aspects in arb_aspects()) {
        let triaged = triage(&aspects, &TierThresholds::default());
        let s = triaged.summary;
        prop_assert_eq!(s.tight_aspects + s.moderate_aspects + s.loose_aspects + s.excluded_aspects, s.total_aspects);
        prop_assert_eq!(s.total_aspects + s.rejected_self_aspects + s.rejected_invalid_orbs, aspects.len());
    }

    #[test]
    fn prop_triage_is_idempotent(aspects in arb_aspects()) {
        let once = triage(&aspects, &TierThresholds::default());
        let flattened: Vec<AspectPair> = once.select(AspectPriority::All).into_iter().cloned().collect();
        let twice = triage(&flattened, &TierThresholds::default());
        prop_assert_eq!(&once.tight, &twice.tight);
        prop_assert_eq!(&once.moderate, &twice.moderate);
        prop_assert_eq!(&once.loose, &twice.loose);
        prop_assert_eq!(&once.excluded, &twice.excluded);
    }

    #[test]
    fn prop_included_size_grows_with_budget(aspects in arb_aspects(), small in 0usize..5_000, extra in 0usize..5_000) {
        let triaged = triage(&aspects, &TierThresholds::default());
        let estimator = FixedSizeEstimator(37);
        let lower = paginate(&triaged, AspectPriority::Tight, &budget(small), &estimator);
        let higher = paginate(&triaged, AspectPriority::Tight, &budget(small + extra), &estimator);
        prop_assert!(lower.estimated_bytes <= higher.estimated_bytes);
        prop_assert!(lower.aspects.len() <= higher.aspects.len());
    }
}
