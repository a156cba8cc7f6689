pub mod source;
pub mod types;

pub use source::{
    Ephemeris, LongitudeSample, LongitudeSource, MeanMotionEphemeris, MeanMotionSource,
    TabulatedEphemeris, TabulatedSource,
};
pub use types::{LayerPositions, PlanetPosition};
