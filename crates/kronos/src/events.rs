//! Per-body lifecycle event detection.
//!
//! Each tracked body is evaluated on its own: a live orb check decides
//! whether a return (or a configured major transit) is active now, and the
//! solver locates the nearest crossing on either side of now. The first
//! window tried is centred on the crossing the body's live position
//! predicts; windows around the occurrences' natural ages follow.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::angle::{normalize, offset, orb_status, signed_orb, OrbStatus};
use crate::config::{CelestialBody, Config, MajorTransit};
use crate::cycles::{
    cycle_number, nearest_occurrence, occurrence_age, CycleClassifier, CycleMarker, Significance,
};
use crate::ephemeris::{Ephemeris, LayerPositions, LongitudeSource, MeanMotionSource};
use crate::error::DataError;
use crate::solver::{solve, RootSearch, SearchWindow};
use crate::time::{datetime_to_julian_day, julian_day_to_datetime, DAYS_PER_YEAR};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventKind {
    Return,
    /// Secondary-progressed Moon back on the natal Moon
    ProgressedReturn,
    MajorTransit {
        id: String,
        name: String,
        aspect_angle: f64,
        typical_age: f64,
        age_range: (f64, f64),
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Upcoming,
    Past,
}

/// How much to trust `exact_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Solver converged below tolerance
    Exact,
    /// Solver hit its iteration cap; the date is the best bracket midpoint
    Reduced,
    /// No crossing found; no date
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub body: String,
    /// "Saturn Return", "Uranus Opposition"
    pub title: String,
    pub occurrence: u32,
    pub marker: CycleMarker,
    pub status: EventStatus,
    /// Live signed orb, only for active events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orb_status: Option<OrbStatus>,
    pub exact_date: Option<DateTime<Utc>>,
    /// Span during which the event is in orb, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub age_at_event: f64,
    /// Negative for past events
    pub years_from_now: f64,
    pub significance: Significance,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    pub precision: Precision,
}

impl LifecycleEvent {
    pub fn is_major(&self) -> bool {
        self.significance.is_major()
    }
}

/// Everything detected for one body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyEvents {
    pub body: String,
    pub natal_longitude: f64,
    pub current_longitude: f64,
    pub events: Vec<LifecycleEvent>,
}

/// The two instants and the snapshots a detection pass runs on.
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub birth: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub natal: &'a LayerPositions,
    pub transit: &'a LayerPositions,
    /// Secondary progressions for `now`; enables the progressed Moon check
    pub progressed: Option<&'a LayerPositions>,
}

/// Result id for the progressed Moon entry of a detection pass.
pub const PROGRESSED_MOON_ID: &str = "progressed_moon";

/// One recurring target for one body: its return, or a major transit.
struct Track<'a> {
    body: &'a CelestialBody,
    transit: Option<&'a MajorTransit>,
    /// Candidate target longitudes; squares have a waxing and a waning one
    targets: Vec<f64>,
    tolerance: f64,
    first_age: f64,
}

impl Track<'_> {
    fn marker(&self, k: u32) -> CycleMarker {
        match self.transit {
            Some(t) => t.marker,
            None => CycleMarker::Return(k),
        }
    }

    fn period_days(&self) -> f64 {
        self.body.orbital_period_years * DAYS_PER_YEAR
    }

    /// Signed mean motion in degrees per day.
    fn mean_speed(&self) -> f64 {
        let speed = 360.0 / self.period_days();
        if self.body.mean_motion_retrograde {
            -speed
        } else {
            speed
        }
    }

    /// Live orb against the closest target, and that target.
    fn live_orb(&self, current_lon: f64) -> (f64, f64) {
        self.targets
            .iter()
            .map(|&t| (signed_orb(t, current_lon), t))
            .min_by(|a, b| a.0.abs().total_cmp(&b.0.abs()))
            .unwrap_or((f64::INFINITY, current_lon))
    }

    /// Next time `target` is reached moving at mean motion from `current_lon` at `now_jd`.
    fn predicted_crossing(&self, target: f64, current_lon: f64, now_jd: f64) -> f64 {
        let speed = self.mean_speed();
        let travel = if speed >= 0.0 {
            normalize(target - current_lon)
        } else {
            normalize(current_lon - target)
        };
        now_jd + travel / speed.abs()
    }
}

/// Timing context shared by every track of one pass.
struct Clock {
    birth_jd: f64,
    now_jd: f64,
}

impl Clock {
    fn age_at(&self, jd: f64) -> f64 {
        (jd - self.birth_jd) / DAYS_PER_YEAR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Where one direction's search may look.
struct Bounds {
    direction: Direction,
    /// Upcoming searches start after this instant, past searches end before it
    limit_jd: f64,
    /// Nothing earlier counts as an occurrence of the track
    opens_jd: f64,
    /// Occurrence to start the natural-age windows from
    start_k: Option<u32>,
}

pub struct EventDetector<'a> {
    config: &'a Config,
    ephemeris: &'a dyn Ephemeris,
}

impl<'a> EventDetector<'a> {
    pub fn new(config: &'a Config, ephemeris: &'a dyn Ephemeris) -> Self {
        Self { config, ephemeris }
    }

    /// One result per subject body: every tracked body plus any body that
    /// only appears in a major-transit definition, then the progressed Moon
    /// when a progressed snapshot is supplied. Failures are logged and
    /// returned, never raised.
    pub fn detect(&self, input: &DetectionInput<'_>) -> Vec<Result<BodyEvents, DataError>> {
        let mut subjects: Vec<&str> = self.config.tracked_bodies.iter().map(String::as_str).collect();
        for transit in &self.config.major_transits {
            if !subjects.contains(&transit.body.as_str()) {
                subjects.push(&transit.body);
            }
        }

        let mut results: Vec<Result<BodyEvents, DataError>> = subjects
            .into_iter()
            .map(|body| self.detect_body(body, input))
            .collect();
        if let Some(progressed) = input.progressed {
            results.push(self.detect_progressed_moon(progressed, input));
        }

        for result in &results {
            if let Err(e) = result {
                log::warn!("Skipping {}: {e}", e.body());
            }
        }
        results
    }

    /// Returns and major transits for a single body.
    pub fn detect_body(&self, id: &str, input: &DetectionInput<'_>) -> Result<BodyEvents, DataError> {
        let body = self.config.body(id).ok_or_else(|| DataError::Source {
            body: id.to_string(),
            message: "body is not configured".to_string(),
        })?;
        let source = self.ephemeris.source(id)?;
        let clock = Clock {
            birth_jd: datetime_to_julian_day(input.birth),
            now_jd: datetime_to_julian_day(input.now),
        };

        let natal_lon = input.natal.longitude("natal", id)?;
        let current_lon = match input.transit.longitude("transit", id) {
            Ok(lon) => lon,
            Err(missing) => source.longitude_at(clock.now_jd).map_err(|_| missing)?,
        };

        let mut tracks = Vec::new();
        if self.config.tracked_bodies.iter().any(|t| t == id) {
            tracks.push(Track {
                body,
                transit: None,
                targets: vec![natal_lon],
                tolerance: body.return_orb,
                first_age: body.orbital_period_years,
            });
        }
        for transit in self.config.major_transits.iter().filter(|t| t.body == id) {
            let mut targets = vec![offset(natal_lon, transit.aspect_angle)];
            if transit.marker == CycleMarker::Square {
                targets.push(offset(natal_lon, -transit.aspect_angle));
            }
            tracks.push(Track {
                body,
                transit: Some(transit),
                targets,
                tolerance: transit.orb,
                first_age: transit.typical_age,
            });
        }

        let mut events = Vec::new();
        for track in &tracks {
            events.extend(self.detect_track(track, source, current_lon, &clock)?);
        }

        Ok(BodyEvents {
            body: id.to_string(),
            natal_longitude: natal_lon,
            current_longitude: current_lon,
            events,
        })
    }

    /// Progressed Moon within orb of the natal Moon.
    ///
    /// Only an active return is reported. The exact date is solved against
    /// the progressed Moon's mean motion through the progressed position.
    pub fn detect_progressed_moon(
        &self,
        progressed: &LayerPositions,
        input: &DetectionInput<'_>,
    ) -> Result<BodyEvents, DataError> {
        let settings = &self.config.progressed_moon;
        let natal_lon = input.natal.longitude("natal", "moon")?;
        let progressed_lon = progressed.longitude("progressed", "moon")?;
        let clock = Clock {
            birth_jd: datetime_to_julian_day(input.birth),
            now_jd: datetime_to_julian_day(input.now),
        };

        let orb = signed_orb(natal_lon, progressed_lon);
        let mut events = Vec::new();
        if orb.abs() <= settings.orb {
            let half_window = settings.half_window_days();
            let source =
                MeanMotionSource::for_period(clock.now_jd, progressed_lon, settings.period_years, false);
            let window = SearchWindow::centred(clock.now_jd, half_window).clamp(clock.birth_jd, f64::INFINITY);
            let search = match window {
                Some(w) => solve(PROGRESSED_MOON_ID, &source, natal_lon, &w, &self.config.solver)?,
                None => RootSearch::NotFound,
            };
            let (precision, event_jd) = precision_of(search);
            let jd = event_jd.unwrap_or(clock.now_jd);
            let cycle = cycle_number(clock.age_at(clock.now_jd), settings.period_years);

            events.push(LifecycleEvent {
                kind: EventKind::ProgressedReturn,
                body: "moon".to_string(),
                title: "Progressed Moon Return".to_string(),
                occurrence: cycle,
                marker: CycleMarker::Return(cycle),
                status: EventStatus::Active,
                orb: Some(orb),
                orb_status: Some(orb_status(orb, settings.orb)),
                exact_date: event_jd.and_then(julian_day_to_datetime),
                date_range: julian_day_to_datetime(clock.now_jd - half_window)
                    .zip(julian_day_to_datetime(clock.now_jd + half_window)),
                age_at_event: clock.age_at(jd),
                years_from_now: (jd - clock.now_jd) / DAYS_PER_YEAR,
                significance: settings.significance,
                keywords: settings.keywords.clone(),
                interpretation: Some(settings.interpretation.clone()),
                precision,
            });
        }

        Ok(BodyEvents {
            body: PROGRESSED_MOON_ID.to_string(),
            natal_longitude: natal_lon,
            current_longitude: progressed_lon,
            events,
        })
    }

    fn detect_track(
        &self,
        track: &Track<'_>,
        source: &dyn LongitudeSource,
        current_lon: f64,
        clock: &Clock,
    ) -> Result<Vec<LifecycleEvent>, DataError> {
        let settings = &self.config.solver;
        let period = track.body.orbital_period_years;
        let half_window = settings.half_window_days(period);
        let w_years = half_window / DAYS_PER_YEAR;
        let opens_jd =
            (clock.birth_jd + track.first_age * DAYS_PER_YEAR - half_window).max(clock.birth_jd);
        let age = clock.age_at(clock.now_jd);
        let (live_orb, live_target) = track.live_orb(current_lon);

        let mut events = Vec::new();
        let mut forward = Bounds {
            direction: Direction::Forward,
            limit_jd: clock.now_jd,
            opens_jd,
            start_k: Some(first_open(age - w_years, track.first_age, period)),
        };
        let mut backward = Bounds {
            direction: Direction::Backward,
            limit_jd: clock.now_jd,
            opens_jd,
            start_k: last_started(age + w_years, track.first_age, period),
        };

        if live_orb.abs() <= track.tolerance && clock.now_jd >= opens_jd {
            let window = SearchWindow::centred(clock.now_jd, half_window).clamp(opens_jd, f64::INFINITY);
            let search = match window {
                Some(w) => solve(&track.body.id, source, live_target, &w, settings)?,
                None => RootSearch::NotFound,
            };
            let k = self
                .occurrence_of(track, search, clock)
                .unwrap_or_else(|| nearest_occurrence(age, track.first_age, period));
            let mut event = self.build_event(track, k, EventStatus::Active, search, clock);
            event.orb = Some(live_orb);
            event.orb_status = Some(orb_status(live_orb, track.tolerance));
            events.push(event);

            forward = Bounds {
                direction: Direction::Forward,
                limit_jd: clock.now_jd + half_window,
                opens_jd,
                start_k: Some(k + 1),
            };
            backward = Bounds {
                direction: Direction::Backward,
                limit_jd: clock.now_jd - half_window,
                opens_jd,
                start_k: (k > 1).then(|| k - 1),
            };
        }

        let upcoming = track
            .targets
            .iter()
            .filter_map(|&target| {
                self.search_direction(track, source, target, current_lon, clock, &forward)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((k, _, search)) = upcoming {
            events.push(self.build_event(track, k, EventStatus::Upcoming, search, clock));
        }

        let past = track
            .targets
            .iter()
            .filter_map(|&target| {
                self.search_direction(track, source, target, current_lon, clock, &backward)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((k, _, search)) = past {
            events.push(self.build_event(track, k, EventStatus::Past, search, clock));
        }

        Ok(events)
    }

    /// Nearest crossing of `target` on one side of `bounds.limit_jd`.
    ///
    /// Tries the window around the predicted crossing first, then the
    /// natural-age windows of up to `max_window_attempts` occurrences.
    /// Source failures away from now are logged and end the search.
    fn search_direction(
        &self,
        track: &Track<'_>,
        source: &dyn LongitudeSource,
        target: f64,
        current_lon: f64,
        clock: &Clock,
        bounds: &Bounds,
    ) -> Option<(u32, f64, RootSearch)> {
        let direction = bounds.direction;
        let settings = &self.config.solver;
        let period = track.body.orbital_period_years;
        let period_days = track.period_days();
        let half_window = settings.half_window_days(period);
        let occurrence_jd =
            |k: u32| clock.birth_jd + occurrence_age(k, track.first_age, period) * DAYS_PER_YEAR;

        let next = track.predicted_crossing(target, current_lon, clock.now_jd);
        let predicted = match direction {
            Direction::Forward => {
                let lower = bounds.limit_jd.max(bounds.opens_jd);
                next + (((lower - next) / period_days).floor() + 1.0) * period_days
            }
            Direction::Backward => {
                next - (((next - bounds.limit_jd) / period_days).floor() + 1.0) * period_days
            }
        };

        let mut centres = vec![(predicted, None)];
        match direction {
            Direction::Forward => {
                if let Some(k0) = bounds.start_k {
                    centres.extend(
                        (k0..)
                            .take(settings.max_window_attempts as usize)
                            .map(|k| (occurrence_jd(k), Some(k))),
                    );
                }
            }
            Direction::Backward => {
                if let Some(k0) = bounds.start_k {
                    centres.extend(
                        (1..=k0)
                            .rev()
                            .take(settings.max_window_attempts as usize)
                            .map(|k| (occurrence_jd(k), Some(k))),
                    );
                }
            }
        }

        for (centre, k) in centres {
            let window = match direction {
                Direction::Forward => SearchWindow::centred(centre, half_window)
                    .clamp(bounds.limit_jd.max(bounds.opens_jd), f64::INFINITY)
                    .map(|w| SearchWindow { reference: w.start, ..w }),
                Direction::Backward => SearchWindow::centred(centre, half_window)
                    .clamp(bounds.opens_jd, bounds.limit_jd)
                    .map(|w| SearchWindow { reference: w.end, ..w }),
            };
            let Some(window) = window else {
                continue;
            };
            let search = match solve(&track.body.id, source, target, &window, settings) {
                Ok(search) => search,
                Err(e) => {
                    log::warn!("{}: giving up on the {direction:?} search: {e}", track.body.id);
                    return None;
                }
            };
            if let Some(root) = search.root() {
                let jd = root.jd;
                let k = self.occurrence_of(track, search, clock).or(k).unwrap_or(1);
                return Some((k, jd, search));
            }
            log::debug!(
                "{}: no crossing of {target:.2} in the window around JD {centre:.1}",
                track.body.id
            );
        }
        None
    }

    /// Occurrence number implied by where a root actually landed.
    fn occurrence_of(&self, track: &Track<'_>, search: RootSearch, clock: &Clock) -> Option<u32> {
        search.root().map(|root| {
            nearest_occurrence(
                clock.age_at(root.jd),
                track.first_age,
                track.body.orbital_period_years,
            )
        })
    }

    fn build_event(
        &self,
        track: &Track<'_>,
        k: u32,
        status: EventStatus,
        search: RootSearch,
        clock: &Clock,
    ) -> LifecycleEvent {
        let classifier = CycleClassifier::new(self.config);
        let marker = track.marker(k);
        let classification = classifier.classify(&track.body.id, marker);

        let (precision, event_jd) = precision_of(search);
        // active events without a solved date are dated "now"
        let jd = event_jd.unwrap_or(clock.now_jd);

        let (kind, title, keywords, interpretation) = match track.transit {
            Some(t) => (
                EventKind::MajorTransit {
                    id: t.id(),
                    name: t.name.clone(),
                    aspect_angle: t.aspect_angle,
                    typical_age: t.typical_age,
                    age_range: t.age_range,
                },
                t.name.clone(),
                if t.keywords.is_empty() {
                    classification.keywords
                } else {
                    t.keywords.clone()
                },
                if t.description.is_empty() {
                    classification.interpretation
                } else {
                    Some(t.description.clone())
                },
            ),
            None => (
                EventKind::Return,
                format!("{} Return", track.body.name),
                classification.keywords,
                classification.interpretation,
            ),
        };

        LifecycleEvent {
            kind,
            body: track.body.id.clone(),
            title,
            occurrence: k,
            marker,
            status,
            orb: None,
            orb_status: None,
            exact_date: event_jd.and_then(julian_day_to_datetime),
            date_range: None,
            age_at_event: clock.age_at(jd),
            years_from_now: (jd - clock.now_jd) / DAYS_PER_YEAR,
            significance: classification.significance,
            keywords,
            interpretation,
            precision,
        }
    }
}

fn precision_of(search: RootSearch) -> (Precision, Option<f64>) {
    match search {
        RootSearch::Found(root) => (Precision::Exact, Some(root.jd)),
        RootSearch::Degenerate(root) => (Precision::Reduced, Some(root.jd)),
        RootSearch::NotFound => (Precision::Unresolved, None),
    }
}

/// First occurrence whose natural age is at or after `age`.
fn first_open(age: f64, first_age: f64, period: f64) -> u32 {
    let k = ((age - first_age) / period).ceil() + 1.0;
    if k.is_finite() && k >= 1.0 {
        k as u32
    } else {
        1
    }
}

/// Last occurrence whose natural age is at or before `age`, if any.
fn last_started(age: f64, first_age: f64, period: f64) -> Option<u32> {
    let k = ((age - first_age) / period).floor() + 1.0;
    (k.is_finite() && k >= 1.0).then(|| k as u32)
}
