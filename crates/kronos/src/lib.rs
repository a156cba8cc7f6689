//! Lifecycle events and aspect triage over chart-engine positions.
//!
//! The pipelines share the angle helpers:
//!
//! * positions → [`events::EventDetector`] → [`timeline::TimelineBuilder`]
//! * Moon samples → [`lunar::lunar_return`] for one calendar month
//! * aspects → [`aspects::triage`] → [`aspects::paginate`]
//!
//! Everything here is synchronous and pure; the [`config::Config`] passed in is
//! the only configuration consulted.

pub mod angle;
pub mod aspects;
pub mod config;
pub mod cycles;
pub mod ephemeris;
pub mod error;
pub mod events;
pub mod lunar;
pub mod solver;
pub mod time;
pub mod timeline;

pub use aspects::{AspectPage, AspectPair, AspectPriority};
pub use config::Config;
pub use error::{ConfigError, DataError};
pub use events::{BodyEvents, DetectionInput, EventDetector, LifecycleEvent};
pub use lunar::{lunar_return, LunarReturn};
pub use timeline::{Timeline, TimelineBuilder};

use ephemeris::Ephemeris;

/// Run the detector over every tracked body.
pub fn detect_lifecycle_events(
    config: &Config,
    ephemeris: &dyn Ephemeris,
    input: &DetectionInput<'_>,
) -> Vec<Result<BodyEvents, DataError>> {
    EventDetector::new(config, ephemeris).detect(input)
}

/// Detection plus timeline assembly.
pub fn build_timeline(
    config: &Config,
    ephemeris: &dyn Ephemeris,
    input: &DetectionInput<'_>,
) -> Timeline {
    let results = detect_lifecycle_events(config, ephemeris, input);
    let timeline = TimelineBuilder::new(config).build(input.birth, input.now, &results);
    log::info!(
        "Timeline at age {:.2}: {} active, {} past, {} upcoming, {} skipped",
        timeline.summary.current_age,
        timeline.current.len(),
        timeline.past.len(),
        timeline.future.len(),
        timeline.summary.skipped_bodies.len()
    );
    timeline
}

/// Triage `aspects` and cut one page within the configured budget.
pub fn paginate_aspects(
    config: &Config,
    aspects: &[AspectPair],
    priority: AspectPriority,
) -> AspectPage {
    let triaged = aspects::triage(aspects, &config.tiers);
    aspects::paginate(
        &triaged,
        priority,
        &aspects::ResponseBudget::from_config(config),
        &aspects::JsonSizeEstimator,
    )
}
