//! Root finder for "when does this body reach that longitude".
//!
//! Coarse scan of the signed difference `signed_orb(target, lon(t))` over a
//! bounded window, then bisection of every genuine sign change. Wrap-around
//! jumps (the difference flipping from +180 to -180) are not crossings.

use serde::{Deserialize, Serialize};

use crate::angle::signed_orb;
use crate::ephemeris::LongitudeSource;
use crate::error::{ensure_finite, ConfigError, DataError};
use crate::time::{DAYS_PER_YEAR, MINUTES_PER_DAY};

/// Largest distance a body may travel between two scan samples.
const MAX_DEGREES_PER_STEP: f64 = 90.0;

/// Which root to report when a window holds several (retrograde loops).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingPolicy {
    #[default]
    NearestToReference,
    Earliest,
    Latest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    /// Bisection stops once the bracket is narrower than this
    pub tolerance_minutes: f64,
    pub max_iterations: u32,
    /// Upper bound on the scan step regardless of body speed
    pub max_step_days: f64,
    /// Cap on longitude evaluations during the scan
    pub max_samples: usize,
    pub crossing_policy: CrossingPolicy,
    /// Half-width of an occurrence window as a fraction of the period
    pub window_fraction: f64,
    /// Floor on the half-width for fast bodies
    pub min_window_days: f64,
    /// Occurrence windows tried before giving up on a direction
    pub max_window_attempts: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance_minutes: 1.0,
            max_iterations: 64,
            max_step_days: 5.0,
            max_samples: 10_000,
            crossing_policy: CrossingPolicy::NearestToReference,
            window_fraction: 0.1,
            min_window_days: 30.0,
            max_window_attempts: 3,
        }
    }
}

impl SolverSettings {
    pub fn tolerance_days(&self) -> f64 {
        self.tolerance_minutes / MINUTES_PER_DAY
    }

    /// Half-width in days of the search window around one occurrence.
    ///
    /// Never more than 0.45 periods, so neighbouring windows can't overlap.
    pub fn half_window_days(&self, period_years: f64) -> f64 {
        let period_days = period_years * DAYS_PER_YEAR;
        (self.window_fraction * period_days)
            .max(self.min_window_days)
            .min(0.45 * period_days)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&str, bool); 7] = [
            (
                "solver.tolerance_minutes",
                self.tolerance_minutes.is_finite() && self.tolerance_minutes > 0.0,
            ),
            ("solver.max_iterations", self.max_iterations > 0),
            (
                "solver.max_step_days",
                self.max_step_days.is_finite() && self.max_step_days > 0.0,
            ),
            ("solver.max_samples", self.max_samples >= 2),
            (
                "solver.window_fraction",
                self.window_fraction.is_finite() && self.window_fraction > 0.0,
            ),
            (
                "solver.min_window_days",
                self.min_window_days.is_finite() && self.min_window_days >= 0.0,
            ),
            ("solver.max_window_attempts", self.max_window_attempts > 0),
        ];
        match checks.iter().find(|(_, ok)| !ok) {
            Some((field, _)) => Err(ConfigError::InvalidFieldValue {
                field: field.to_string(),
                message: "out of range".to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Bounded search interval in Julian days. `reference` is the instant the
/// `NearestToReference` policy measures from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchWindow {
    pub start: f64,
    pub end: f64,
    pub reference: f64,
}

impl SearchWindow {
    pub fn new(start: f64, end: f64, reference: f64) -> Self {
        Self {
            start,
            end,
            reference,
        }
    }

    pub fn centred(centre: f64, half_width: f64) -> Self {
        Self::new(centre - half_width, centre + half_width, centre)
    }

    pub fn len_days(&self) -> f64 {
        self.end - self.start
    }

    /// The part of this window inside `[from, to]`, or None when they don't meet.
    pub fn clamp(&self, from: f64, to: f64) -> Option<Self> {
        let start = self.start.max(from);
        let end = self.end.min(to);
        (start < end).then(|| Self::new(start, end, self.reference.clamp(start, end)))
    }
}

/// A located crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    /// Best estimate, midpoint of the final bracket
    pub jd: f64,
    /// Final bracket `(lo, hi)`
    pub interval: (f64, f64),
    pub iterations: u32,
    /// Bracket narrowed below tolerance
    pub precise: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RootSearch {
    Found(Root),
    /// Iteration cap hit before the bracket reached tolerance
    Degenerate(Root),
    /// The window contains no crossing
    NotFound,
}

impl RootSearch {
    pub fn root(&self) -> Option<&Root> {
        match self {
            RootSearch::Found(root) | RootSearch::Degenerate(root) => Some(root),
            RootSearch::NotFound => None,
        }
    }
}

/// Genuine zero crossing, not the ±180 seam.
fn is_genuine_crossing(f_a: f64, f_b: f64) -> bool {
    f_a * f_b < 0.0 && (f_a - f_b).abs() < 270.0
}

struct Sampler<'a> {
    body: &'a str,
    source: &'a dyn LongitudeSource,
    target: f64,
}

impl Sampler<'_> {
    fn diff(&self, jd: f64) -> Result<f64, DataError> {
        let lon = ensure_finite(self.body, "longitude", self.source.longitude_at(jd)?)?;
        Ok(signed_orb(self.target, lon))
    }

    fn bisect(
        &self,
        mut t_a: f64,
        mut f_a: f64,
        mut t_b: f64,
        settings: &SolverSettings,
    ) -> Result<Root, DataError> {
        let tolerance = settings.tolerance_days();
        let mut iterations = 0;
        while t_b - t_a >= tolerance && iterations < settings.max_iterations {
            let t_mid = 0.5 * (t_a + t_b);
            let f_mid = self.diff(t_mid)?;
            iterations += 1;
            if f_mid == 0.0 {
                return Ok(Root {
                    jd: t_mid,
                    interval: (t_mid, t_mid),
                    iterations,
                    precise: true,
                });
            }
            if f_a * f_mid < 0.0 {
                t_b = t_mid;
            } else {
                t_a = t_mid;
                f_a = f_mid;
            }
        }
        Ok(Root {
            jd: 0.5 * (t_a + t_b),
            interval: (t_a, t_b),
            iterations,
            precise: t_b - t_a < tolerance,
        })
    }
}

/// Scan step for a body: slow enough that it can't move more than 90° per
/// step, and no coarser than `max_step_days`, widened only if the sample cap
/// would otherwise be exceeded.
fn scan_step(window: &SearchWindow, max_speed: f64, settings: &SolverSettings) -> f64 {
    let mut step = settings.max_step_days;
    if max_speed.is_finite() && max_speed > 0.0 {
        step = step.min(MAX_DEGREES_PER_STEP / max_speed);
    }
    let budget_step = window.len_days() / (settings.max_samples - 1) as f64;
    if budget_step > step {
        log::debug!(
            "Sample cap forces scan step {:.3}d (speed bound {:.3}d)",
            budget_step,
            step
        );
        step = budget_step;
    }
    step
}

/// Find the moment `source` reaches `target` inside `window`.
///
/// `NotFound` is an ordinary outcome; only source failures are errors.
pub fn solve(
    body: &str,
    source: &dyn LongitudeSource,
    target: f64,
    window: &SearchWindow,
    settings: &SolverSettings,
) -> Result<RootSearch, DataError> {
    if !(window.start.is_finite() && window.end.is_finite() && window.start < window.end) {
        log::debug!("Empty search window for {body}: {window:?}");
        return Ok(RootSearch::NotFound);
    }
    let window = match source.coverage() {
        Some((first, last)) => match window.clamp(first, last) {
            Some(w) => w,
            None => {
                log::debug!("{body}: window {window:?} lies outside the source's samples");
                return Ok(RootSearch::NotFound);
            }
        },
        None => *window,
    };

    let sampler = Sampler {
        body,
        source,
        target,
    };
    let step = scan_step(&window, source.max_speed(), settings);
    let steps = (window.len_days() / step).ceil().max(1.0) as usize;

    let mut roots = Vec::new();
    let mut t_prev = window.start;
    let mut f_prev = sampler.diff(t_prev)?;
    if f_prev == 0.0 {
        roots.push(exact_root(t_prev));
    }
    for i in 1..=steps {
        let t_curr = if i == steps {
            window.end
        } else {
            (window.start + i as f64 * step).min(window.end)
        };
        let f_curr = sampler.diff(t_curr)?;
        if f_curr == 0.0 {
            roots.push(exact_root(t_curr));
        } else if is_genuine_crossing(f_prev, f_curr) {
            roots.push(sampler.bisect(t_prev, f_prev, t_curr, settings)?);
        }
        t_prev = t_curr;
        f_prev = f_curr;
    }

    log::debug!(
        "{body}: {} crossing(s) of {target:.3}° in [{:.2}, {:.2}] (step {step:.3}d)",
        roots.len(),
        window.start,
        window.end
    );

    let chosen = match settings.crossing_policy {
        CrossingPolicy::NearestToReference => roots.into_iter().min_by(|a, b| {
            (a.jd - window.reference)
                .abs()
                .total_cmp(&(b.jd - window.reference).abs())
        }),
        CrossingPolicy::Earliest => roots.into_iter().min_by(|a, b| a.jd.total_cmp(&b.jd)),
        CrossingPolicy::Latest => roots.into_iter().max_by(|a, b| a.jd.total_cmp(&b.jd)),
    };

    Ok(match chosen {
        Some(root) if root.precise => RootSearch::Found(root),
        Some(root) => {
            log::warn!(
                "{body}: solver stopped after {} iterations with a {:.2} minute bracket",
                root.iterations,
                (root.interval.1 - root.interval.0) * MINUTES_PER_DAY
            );
            RootSearch::Degenerate(root)
        }
        None => RootSearch::NotFound,
    })
}

fn exact_root(jd: f64) -> Root {
    Root {
        jd,
        interval: (jd, jd),
        iterations: 0,
        precise: true,
    }
}
