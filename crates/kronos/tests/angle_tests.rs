use approx::assert_abs_diff_eq;
use kronos::angle::{normalize, offset, orb_status, separation, signed_orb, OrbStatus};
use proptest::prelude::*;

#[test]
fn test_signed_orb_wraps_across_zero() {
    assert_abs_diff_eq!(signed_orb(359.0, 1.0), 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(signed_orb(1.0, 359.0), -2.0, epsilon = 1e-9);
}

#[test]
fn test_signed_orb_saturn_scenario() {
    assert_abs_diff_eq!(signed_orb(15.24, 14.60), -0.64, epsilon = 1e-9);
}

#[test]
fn test_exact_opposition_is_positive_both_ways() {
    assert_eq!(signed_orb(0.0, 180.0), 180.0);
    assert_eq!(signed_orb(180.0, 0.0), 180.0);
}

#[test]
fn test_offset_and_separation() {
    assert_abs_diff_eq!(offset(350.0, 20.0), 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(offset(10.0, -90.0), 280.0, epsilon = 1e-9);
    assert_abs_diff_eq!(separation(10.0, 280.0), 90.0, epsilon = 1e-9);
}

#[test]
fn test_orb_status_bands() {
    assert_eq!(orb_status(0.4, 1.5), OrbStatus::Exact);
    assert_eq!(orb_status(-0.64, 3.0), OrbStatus::Tight);
    assert_eq!(orb_status(1.5, 3.0), OrbStatus::Moderate);
    assert_eq!(orb_status(2.9, 3.0), OrbStatus::Loose);
    assert_eq!(orb_status(3.1, 3.0), OrbStatus::Inactive);
}

proptest! {
    #[test]
    fn prop_normalize_range(angle in -1.0e6f64..1.0e6) {
        let n = normalize(angle);
        prop_assert!((0.0..360.0).contains(&n));
    }

    #[test]
    fn prop_signed_orb_range(a in -720.0f64..720.0, b in -720.0f64..720.0) {
        let orb = signed_orb(a, b);
        prop_assert!(orb > -180.0 && orb <= 180.0);
    }

    #[test]
    fn prop_signed_orb_antisymmetric(a in 0.0f64..360.0, b in 0.0f64..360.0) {
        let forward = signed_orb(a, b);
        prop_assume!((forward.abs() - 180.0).abs() > 1e-6);
        prop_assert!((forward + signed_orb(b, a)).abs() < 1e-9);
    }

    #[test]
    fn prop_signed_orb_recovers_target(natal in 0.0f64..360.0, delta in -179.0f64..179.0) {
        let orb = signed_orb(natal, natal + delta);
        prop_assert!((orb - delta).abs() < 1e-6);
    }
}
