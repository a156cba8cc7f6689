//! Time-varying longitude functions consumed by the return solver.
//!
//! The chart engine is external; these sources are the boundary it is seen
//! through. `MeanMotionSource` projects linearly from one snapshot,
//! `TabulatedSource` interpolates between samples the engine produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::angle::{normalize, signed_orb};
use crate::config::Config;
use crate::ephemeris::types::LayerPositions;
use crate::error::{ensure_finite, DataError};
use crate::time::{datetime_to_julian_day, DAYS_PER_YEAR};

/// A body's ecliptic longitude as a continuous function of time.
pub trait LongitudeSource {
    /// Longitude in [0, 360) at Julian day `jd`.
    fn longitude_at(&self, jd: f64) -> Result<f64, DataError>;

    /// Upper bound on |speed| in degrees per day, used to size sampling steps.
    fn max_speed(&self) -> f64;

    /// Julian-day range the source can answer for; `None` means unbounded.
    fn coverage(&self) -> Option<(f64, f64)> {
        None
    }
}

/// Maps body ids to longitude sources.
pub trait Ephemeris {
    fn source(&self, body: &str) -> Result<&dyn LongitudeSource, DataError>;
}

/// Linear projection at constant speed from a reference position.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanMotionSource {
    pub reference_jd: f64,
    pub reference_lon: f64,
    pub speed_deg_per_day: f64,
}

impl MeanMotionSource {
    pub fn new(reference_jd: f64, reference_lon: f64, speed_deg_per_day: f64) -> Self {
        Self {
            reference_jd,
            reference_lon,
            speed_deg_per_day,
        }
    }

    /// Mean motion for a body with the given sidereal period.
    pub fn for_period(
        reference_jd: f64,
        reference_lon: f64,
        period_years: f64,
        retrograde: bool,
    ) -> Self {
        let speed = 360.0 / (period_years * DAYS_PER_YEAR);
        Self::new(
            reference_jd,
            reference_lon,
            if retrograde { -speed } else { speed },
        )
    }
}

impl LongitudeSource for MeanMotionSource {
    fn longitude_at(&self, jd: f64) -> Result<f64, DataError> {
        Ok(normalize(
            self.reference_lon + self.speed_deg_per_day * (jd - self.reference_jd),
        ))
    }

    fn max_speed(&self) -> f64 {
        self.speed_deg_per_day.abs()
    }
}

/// One longitude reading from the chart engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongitudeSample {
    pub at: DateTime<Utc>,
    pub lon: f64,
}

/// Piecewise-linear interpolation over engine samples.
///
/// Longitudes are unwrapped on construction, so a body passing 360° → 0°
/// between two samples interpolates through 0° instead of sweeping back
/// across the whole zodiac. Consecutive samples must be less than 180° apart.
#[derive(Debug, Clone)]
pub struct TabulatedSource {
    body: String,
    jds: Vec<f64>,
    unwrapped: Vec<f64>,
    max_speed: f64,
}

impl TabulatedSource {
    pub fn new(body: &str, samples: &[LongitudeSample]) -> Result<Self, DataError> {
        let mut points = Vec::with_capacity(samples.len());
        for sample in samples {
            let lon = ensure_finite(body, "sample longitude", sample.lon)?;
            points.push((datetime_to_julian_day(sample.at), normalize(lon)));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.dedup_by(|later, earlier| later.0 == earlier.0);

        if points.len() < 2 {
            return Err(DataError::Source {
                body: body.to_string(),
                message: format!("need at least two distinct samples, got {}", points.len()),
            });
        }

        let mut jds: Vec<f64> = Vec::with_capacity(points.len());
        let mut unwrapped: Vec<f64> = Vec::with_capacity(points.len());
        let mut max_speed: f64 = 0.0;
        for (jd, lon) in points {
            let next = match (jds.last().copied(), unwrapped.last().copied()) {
                (Some(prev_jd), Some(prev_lon)) => {
                    let next = prev_lon + signed_orb(normalize(prev_lon), lon);
                    max_speed = max_speed.max(((next - prev_lon) / (jd - prev_jd)).abs());
                    next
                }
                _ => lon,
            };
            unwrapped.push(next);
            jds.push(jd);
        }

        Ok(Self {
            body: body.to_string(),
            jds,
            unwrapped,
            max_speed,
        })
    }

    pub fn first_jd(&self) -> f64 {
        self.jds[0]
    }

    pub fn last_jd(&self) -> f64 {
        self.jds[self.jds.len() - 1]
    }
}

impl LongitudeSource for TabulatedSource {
    fn longitude_at(&self, jd: f64) -> Result<f64, DataError> {
        let (first, last) = (self.first_jd(), self.last_jd());
        if !(first..=last).contains(&jd) {
            return Err(DataError::OutOfRange {
                body: self.body.clone(),
                jd,
                first,
                last,
            });
        }
        // index of the first sample strictly after jd, clamped to a valid segment
        let upper = self.jds.partition_point(|&t| t <= jd).clamp(1, self.jds.len() - 1);
        let (t0, t1) = (self.jds[upper - 1], self.jds[upper]);
        let (l0, l1) = (self.unwrapped[upper - 1], self.unwrapped[upper]);
        let fraction = (jd - t0) / (t1 - t0);
        Ok(normalize(l0 + (l1 - l0) * fraction))
    }

    fn max_speed(&self) -> f64 {
        self.max_speed
    }

    fn coverage(&self) -> Option<(f64, f64)> {
        Some((self.first_jd(), self.last_jd()))
    }
}

/// Every configured body projected at mean motion from one snapshot.
#[derive(Debug, Clone, Default)]
pub struct MeanMotionEphemeris {
    sources: HashMap<String, MeanMotionSource>,
}

impl MeanMotionEphemeris {
    /// Anchor each body's projection at its position in `snapshot`.
    ///
    /// Bodies missing from the snapshot or with non-finite longitudes are left
    /// out; asking for them later yields a `DataError`.
    pub fn from_snapshot(config: &Config, at: DateTime<Utc>, snapshot: &LayerPositions) -> Self {
        let jd = datetime_to_julian_day(at);
        let sources = config
            .bodies
            .iter()
            .filter_map(|body| {
                let lon = snapshot.longitude("transit", &body.id).ok()?;
                Some((
                    body.id.clone(),
                    MeanMotionSource::for_period(
                        jd,
                        lon,
                        body.orbital_period_years,
                        body.mean_motion_retrograde,
                    ),
                ))
            })
            .collect();
        Self { sources }
    }

    pub fn insert(&mut self, body: &str, source: MeanMotionSource) {
        self.sources.insert(body.to_string(), source);
    }
}

impl Ephemeris for MeanMotionEphemeris {
    fn source(&self, body: &str) -> Result<&dyn LongitudeSource, DataError> {
        self.sources
            .get(body)
            .map(|s| s as &dyn LongitudeSource)
            .ok_or_else(|| DataError::MissingPosition {
                body: body.to_string(),
                layer: "ephemeris".to_string(),
            })
    }
}

/// Sampled series per body, as produced by stepping the chart engine.
#[derive(Debug, Clone, Default)]
pub struct TabulatedEphemeris {
    sources: HashMap<String, TabulatedSource>,
}

impl TabulatedEphemeris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one source per body; a body with unusable samples is reported
    /// in the returned error list and skipped.
    pub fn from_samples(samples: &HashMap<String, Vec<LongitudeSample>>) -> (Self, Vec<DataError>) {
        let mut ephemeris = Self::new();
        let mut errors = Vec::new();
        for (body, series) in samples {
            match TabulatedSource::new(body, series) {
                Ok(source) => {
                    ephemeris.sources.insert(body.clone(), source);
                }
                Err(e) => errors.push(e),
            }
        }
        (ephemeris, errors)
    }

    pub fn insert(&mut self, body: &str, source: TabulatedSource) {
        self.sources.insert(body.to_string(), source);
    }
}

impl Ephemeris for TabulatedEphemeris {
    fn source(&self, body: &str) -> Result<&dyn LongitudeSource, DataError> {
        self.sources
            .get(body)
            .map(|s| s as &dyn LongitudeSource)
            .ok_or_else(|| DataError::MissingPosition {
                body: body.to_string(),
                layer: "ephemeris".to_string(),
            })
    }
}
