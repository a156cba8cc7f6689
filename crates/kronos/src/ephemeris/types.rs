use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ensure_finite, DataError};

/// Planetary position data as delivered by the chart engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    /// Longitude in degrees (0-360)
    pub lon: f64,
    /// Latitude in degrees
    #[serde(default)]
    pub lat: f64,
    /// Declination in degrees, when the engine reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declination: Option<f64>,
    /// Speed in longitude (degrees per day)
    #[serde(default)]
    pub speed_lon: f64,
    /// Whether the planet is retrograde
    #[serde(default)]
    pub retrograde: bool,
    /// House placement (1-12), if a location was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house: Option<u8>,
}

impl PlanetPosition {
    /// Position with the retrograde flag derived from the speed.
    pub fn new(lon: f64, speed_lon: f64) -> Self {
        Self {
            lon,
            lat: 0.0,
            declination: None,
            speed_lon,
            retrograde: speed_lon < 0.0,
            house: None,
        }
    }

    pub fn is_retrograde(&self) -> bool {
        self.speed_lon < 0.0
    }
}

/// Complete position data for a chart layer ("natal", "transit", ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerPositions {
    /// Planet ID -> position
    pub planets: HashMap<String, PlanetPosition>,
}

impl LayerPositions {
    pub fn insert(&mut self, planet_id: &str, position: PlanetPosition) {
        self.planets.insert(planet_id.to_string(), position);
    }

    /// Finite longitude for `planet_id`, or the reason there isn't one.
    pub fn longitude(&self, layer: &str, planet_id: &str) -> Result<f64, DataError> {
        let position = self
            .planets
            .get(planet_id)
            .ok_or_else(|| DataError::MissingPosition {
                body: planet_id.to_string(),
                layer: layer.to_string(),
            })?;
        ensure_finite(planet_id, "longitude", position.lon)
    }
}

impl FromIterator<(String, PlanetPosition)> for LayerPositions {
    fn from_iter<T: IntoIterator<Item = (String, PlanetPosition)>>(iter: T) -> Self {
        Self {
            planets: iter.into_iter().collect(),
        }
    }
}
