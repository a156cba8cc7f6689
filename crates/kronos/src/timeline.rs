//! Aggregates per-body detection results into one timeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use crate::config::Config;
use crate::cycles::Significance;
use crate::error::DataError;
use crate::events::{BodyEvents, EventStatus, LifecycleEvent};
use crate::time::years_between;

/// Where the label for the current life stage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSource {
    ActiveEvent,
    AgeBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifeStageLabel {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub themes: Vec<String>,
    pub source: StageSource,
}

/// A body detection could not run for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedBody {
    pub body: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSummary {
    pub current_age: f64,
    pub life_stage: LifeStageLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_major_event: Option<LifecycleEvent>,
    pub active_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_significance: Option<Significance>,
    pub skipped_bodies: Vec<SkippedBody>,
    pub headline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub birth: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub current: Vec<LifecycleEvent>,
    pub past: Vec<LifecycleEvent>,
    pub future: Vec<LifecycleEvent>,
    pub summary: TimelineSummary,
}

impl Timeline {
    /// Every event in the timeline, oldest first.
    pub fn chronological(&self) -> Vec<&LifecycleEvent> {
        let mut all: Vec<&LifecycleEvent> = self
            .past
            .iter()
            .chain(&self.current)
            .chain(&self.future)
            .collect();
        all.sort_by(|a, b| a.years_from_now.total_cmp(&b.years_from_now));
        all
    }
}

pub struct TimelineBuilder<'a> {
    config: &'a Config,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Pure function of its arguments; identical input gives identical output.
    pub fn build(
        &self,
        birth: DateTime<Utc>,
        now: DateTime<Utc>,
        results: &[Result<BodyEvents, DataError>],
    ) -> Timeline {
        let settings = &self.config.timeline;
        let current_age = years_between(birth, now);

        let mut current = Vec::new();
        let mut past = Vec::new();
        let mut future = Vec::new();
        let mut skipped_bodies = Vec::new();

        for result in results {
            match result {
                Ok(body) => {
                    for event in &body.events {
                        match event.status {
                            EventStatus::Active => current.push(event.clone()),
                            EventStatus::Past => past.push(event.clone()),
                            EventStatus::Upcoming => future.push(event.clone()),
                        }
                    }
                }
                Err(e) => skipped_bodies.push(SkippedBody {
                    body: e.body().to_string(),
                    reason: e.to_string(),
                }),
            }
        }

        current.sort_by(by_significance_then_orb);
        past.sort_by(by_time_distance);
        past.truncate(settings.max_past_events);
        future.retain(|e| e.years_from_now <= settings.future_years);
        future.sort_by(by_time_distance);
        future.truncate(settings.max_future_events);

        let life_stage = self.life_stage(current_age, &current);
        let next_major_event = future
            .iter()
            .find(|e| e.is_major())
            .or_else(|| future.first())
            .cloned();
        let highest_significance = current.iter().map(|e| e.significance).min();
        let headline = headline(current_age, &life_stage, &current, next_major_event.as_ref());

        Timeline {
            birth,
            now,
            summary: TimelineSummary {
                current_age,
                life_stage,
                next_major_event,
                active_count: current.len(),
                highest_significance,
                skipped_bodies,
                headline,
            },
            current,
            past,
            future,
        }
    }

    /// The tightest major active event names the stage; otherwise the age band.
    fn life_stage(&self, age: f64, current: &[LifecycleEvent]) -> LifeStageLabel {
        let tightest = current
            .iter()
            .filter(|e| e.is_major())
            .min_by(|a, b| abs_orb(a).total_cmp(&abs_orb(b)));

        if let Some(event) = tightest {
            return LifeStageLabel {
                name: event.title.clone(),
                description: event.interpretation.clone(),
                themes: event.keywords.clone(),
                source: StageSource::ActiveEvent,
            };
        }

        match self.config.life_stage(age) {
            Some(stage) => LifeStageLabel {
                name: stage.name.clone(),
                description: Some(stage.description.clone()),
                themes: stage.themes.clone(),
                source: StageSource::AgeBand,
            },
            None => LifeStageLabel {
                name: "Unclassified".to_string(),
                description: None,
                themes: Vec::new(),
                source: StageSource::AgeBand,
            },
        }
    }
}

fn abs_orb(event: &LifecycleEvent) -> f64 {
    event.orb.map_or(f64::INFINITY, f64::abs)
}

fn by_significance_then_orb(a: &LifecycleEvent, b: &LifecycleEvent) -> Ordering {
    a.significance
        .cmp(&b.significance)
        .then_with(|| abs_orb(a).total_cmp(&abs_orb(b)))
        .then_with(|| a.title.cmp(&b.title))
}

fn by_time_distance(a: &LifecycleEvent, b: &LifecycleEvent) -> Ordering {
    a.years_from_now
        .abs()
        .total_cmp(&b.years_from_now.abs())
        .then_with(|| a.significance.cmp(&b.significance))
        .then_with(|| a.title.cmp(&b.title))
}

fn headline(
    age: f64,
    stage: &LifeStageLabel,
    current: &[LifecycleEvent],
    next: Option<&LifecycleEvent>,
) -> String {
    let mut line = match stage.source {
        StageSource::ActiveEvent => {
            let others = current.len().saturating_sub(1);
            if others > 0 {
                format!("At {age:.1} you are in your {} alongside {others} other active cycle(s)", stage.name)
            } else {
                format!("At {age:.1} you are in your {}", stage.name)
            }
        }
        StageSource::AgeBand => format!("At {age:.1} you are in the {} stage", stage.name),
    };
    if let Some(event) = next {
        let when = event
            .exact_date
            .map(|d| format!(" ({})", d.format("%Y-%m-%d")))
            .unwrap_or_default();
        line.push_str(&format!(
            ", with {} arriving in {:.1} years{when}",
            event.title, event.years_from_now
        ));
    }
    line.push('.');
    line
}
