//! Circular angle helpers shared by the lifecycle and aspect pipelines.
//!
//! Longitudes live on a circle, so every difference has to be taken modulo
//! 360°. `signed_orb` is the one function the rest of the crate leans on.

use serde::{Deserialize, Serialize};

/// Wrap any finite angle into [0, 360).
pub fn normalize(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed distance from `natal` to `transiting` in (-180, 180].
///
/// Positive means the transiting longitude is ahead of the natal one in
/// zodiacal order. `signed_orb(a, b) == -signed_orb(b, a)` everywhere except
/// at exactly 180°, where both directions report +180.
pub fn signed_orb(natal: f64, transiting: f64) -> f64 {
    let diff = normalize(transiting - natal);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Unsigned angular separation in [0, 180].
pub fn separation(a: f64, b: f64) -> f64 {
    signed_orb(a, b).abs()
}

/// `lon + degrees`, wrapped.
pub fn offset(lon: f64, degrees: f64) -> f64 {
    normalize(lon + degrees)
}

/// How tight an orb is relative to a tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbStatus {
    Exact,
    Tight,
    Moderate,
    Loose,
    Inactive,
}

/// Anything within half a degree is exact regardless of tolerance; beyond
/// that the tolerance is split into thirds.
pub fn orb_status(orb: f64, tolerance: f64) -> OrbStatus {
    let abs_orb = orb.abs();
    if abs_orb <= 0.5 {
        OrbStatus::Exact
    } else if abs_orb <= tolerance * 0.33 {
        OrbStatus::Tight
    } else if abs_orb <= tolerance * 0.66 {
        OrbStatus::Moderate
    } else if abs_orb <= tolerance {
        OrbStatus::Loose
    } else {
        OrbStatus::Inactive
    }
}
