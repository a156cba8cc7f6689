use anyhow::Context;
use chrono::{DateTime, Utc};
use kronos::aspects::{AspectCalculator, AspectPair, AspectSettings};
use kronos::ephemeris::{
    Ephemeris, LayerPositions, LongitudeSample, LongitudeSource, MeanMotionEphemeris,
    MeanMotionSource, TabulatedEphemeris, TabulatedSource,
};
use kronos::time::datetime_to_julian_day;
use kronos::Config;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Input for the `lifecycle` subcommand.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleRequest {
    pub birth: DateTime<Utc>,
    /// Defaults to the current time
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    pub natal: LayerPositions,
    pub transit: LayerPositions,
    /// Sampled longitudes per body; without them bodies move at mean motion
    #[serde(default)]
    pub samples: Option<HashMap<String, Vec<LongitudeSample>>>,
    /// Secondary progressions for `now`, for the progressed Moon check
    #[serde(default)]
    pub progressed: Option<LayerPositions>,
}

impl LifecycleRequest {
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Tabulated samples when present, else a mean-motion projection from
    /// the transit snapshot.
    pub fn ephemeris(&self, config: &Config) -> Box<dyn Ephemeris> {
        match &self.samples {
            Some(samples) => {
                let (ephemeris, errors) = TabulatedEphemeris::from_samples(samples);
                for e in errors {
                    log::warn!("Ignoring samples: {e}");
                }
                Box::new(ephemeris)
            }
            None => Box::new(MeanMotionEphemeris::from_snapshot(
                config,
                self.now(),
                &self.transit,
            )),
        }
    }
}

/// Input for the `lunar-return` subcommand.
#[derive(Debug, Clone, Deserialize)]
pub struct LunarReturnRequest {
    pub natal: LayerPositions,
    pub year: i32,
    pub month: u32,
    /// Sampled Moon longitudes covering the month
    #[serde(default)]
    pub samples: Option<Vec<LongitudeSample>>,
    /// Moon snapshot to project at mean motion when there are no samples
    #[serde(default)]
    pub transit: Option<LayerPositions>,
    /// When `transit` was taken
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

impl LunarReturnRequest {
    pub fn natal_moon(&self) -> anyhow::Result<f64> {
        Ok(self.natal.longitude("natal", "moon")?)
    }

    pub fn moon_source(&self, config: &Config) -> anyhow::Result<Box<dyn LongitudeSource>> {
        if let Some(samples) = &self.samples {
            return Ok(Box::new(TabulatedSource::new("moon", samples)?));
        }
        let (Some(transit), Some(at)) = (&self.transit, self.at) else {
            anyhow::bail!("Lunar return request needs `samples` or `transit` with `at`");
        };
        let moon = config.body("moon").context("Moon is not configured")?;
        Ok(Box::new(MeanMotionSource::for_period(
            datetime_to_julian_day(at),
            transit.longitude("transit", "moon")?,
            moon.orbital_period_years,
            moon.mean_motion_retrograde,
        )))
    }
}

/// Input for the `aspects` subcommand: a precomputed list, or two snapshots
/// to compute transit-to-natal aspects from.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AspectsRequest {
    List {
        aspects: Vec<AspectPair>,
    },
    Snapshots {
        natal: LayerPositions,
        transit: LayerPositions,
        #[serde(default)]
        orb_settings: HashMap<String, f64>,
    },
}

impl AspectsRequest {
    pub fn into_aspects(self) -> Vec<AspectPair> {
        match self {
            AspectsRequest::List { aspects } => aspects,
            AspectsRequest::Snapshots {
                natal,
                transit,
                orb_settings,
            } => {
                let settings = AspectSettings {
                    orb_settings,
                    ..AspectSettings::default()
                };
                AspectCalculator::new()
                    .compute_inter_layer_aspects("transit", "natal", &transit, &natal, &settings)
                    .pairs
            }
        }
    }
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse request {}", path.display()))
}
