use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The five aspects the calculator looks for, most common first.
pub const MAJOR_ASPECTS: &[(&str, f64)] = &[
    ("conjunction", 0.0),
    ("opposition", 180.0),
    ("trine", 120.0),
    ("square", 90.0),
    ("sextile", 60.0),
];

pub const DEFAULT_ASPECT_ORB: f64 = 8.0;

/// Core aspect information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectCore {
    /// Aspect type: "conjunction", "trine", etc.
    pub aspect_type: String,
    /// Exact angle for this aspect (0, 60, 90, 120, 180)
    pub exact_angle: f64,
    /// Deviation from the exact angle, >= 0
    pub orb: f64,
    /// Whether the aspect is applying (approaching exact)
    #[serde(default)]
    pub is_applying: bool,
    /// Within 0.1 degrees
    #[serde(default)]
    pub is_exact: bool,
    /// Whether either body is retrograde
    #[serde(default)]
    pub is_retrograde: bool,
}

/// Reference to one side of an aspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectObjectRef {
    pub layer_id: String,
    /// "planet", "house", "angle"
    #[serde(default = "default_object_type")]
    pub object_type: String,
    /// "sun", "moon", "asc", "1", ...
    pub object_id: String,
}

fn default_object_type() -> String {
    "planet".to_string()
}

impl AspectObjectRef {
    pub fn planet(layer_id: &str, object_id: &str) -> Self {
        Self {
            layer_id: layer_id.to_string(),
            object_type: default_object_type(),
            object_id: object_id.to_string(),
        }
    }
}

/// An aspect between two objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectPair {
    pub from: AspectObjectRef,
    pub to: AspectObjectRef,
    pub aspect: AspectCore,
}

impl AspectPair {
    /// Both sides name the same object id ("sun" to "sun").
    pub fn is_self_aspect(&self) -> bool {
        self.from.object_id == self.to.object_id
    }
}

/// A set of aspects (intra-layer or inter-layer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSet {
    pub id: String,
    pub label: String,
    /// "intra_layer" or "inter_layer"
    pub kind: String,
    pub layer_ids: Vec<String>,
    pub pairs: Vec<AspectPair>,
}

/// Settings for aspect calculations
#[derive(Debug, Clone, PartialEq)]
pub struct AspectSettings {
    /// Orb per aspect type; missing types use `DEFAULT_ASPECT_ORB`
    pub orb_settings: HashMap<String, f64>,
    /// Planet ids to include; empty means all
    pub include_objects: Vec<String>,
}

impl AspectSettings {
    pub fn orb_for(&self, aspect_type: &str) -> f64 {
        self.orb_settings
            .get(aspect_type)
            .copied()
            .unwrap_or(DEFAULT_ASPECT_ORB)
    }

    pub fn includes(&self, object_id: &str) -> bool {
        self.include_objects.is_empty() || self.include_objects.iter().any(|o| o == object_id)
    }
}

impl Default for AspectSettings {
    fn default() -> Self {
        Self {
            orb_settings: MAJOR_ASPECTS
                .iter()
                .map(|(name, _)| (name.to_string(), DEFAULT_ASPECT_ORB))
                .collect(),
            include_objects: Vec::new(),
        }
    }
}
