use thiserror::Error;

/// Bad or missing position data for a single body.
///
/// Fatal to that body's detection only; the rest of the request continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No {layer} position for {body}")]
    MissingPosition { body: String, layer: String },
    #[error("Non-finite {field} for {body}: {value}")]
    NonFinite {
        body: String,
        field: String,
        value: f64,
    },
    #[error("Julian day {jd} is outside the tabulated range for {body} ({first}..{last})")]
    OutOfRange {
        body: String,
        jd: f64,
        first: f64,
        last: f64,
    },
    #[error("Longitude source failed for {body}: {message}")]
    Source { body: String, message: String },
    #[error("No calendar month {year}-{month:02} to search for {body}")]
    InvalidMonth { body: String, year: i32, month: u32 },
}

impl DataError {
    pub fn body(&self) -> &str {
        match self {
            DataError::MissingPosition { body, .. }
            | DataError::NonFinite { body, .. }
            | DataError::OutOfRange { body, .. }
            | DataError::Source { body, .. }
            | DataError::InvalidMonth { body, .. } => body,
        }
    }
}

/// Malformed static configuration. Raised at startup, never per request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Orbital period for {body} must be positive and finite, got {period}")]
    InvalidPeriod { body: String, period: f64 },
    #[error("Orb tolerance for {subject} must be non-negative and finite, got {orb}")]
    InvalidOrb { subject: String, orb: f64 },
    #[error("Unknown body: {body}. Known bodies: {known:?}")]
    UnknownBody { body: String, known: Vec<String> },
    #[error("Tier thresholds must be ascending and positive (tight {tight}, moderate {moderate}, loose {loose})")]
    InvalidThresholds { tight: f64, moderate: f64, loose: f64 },
    #[error("Response budget must be greater than zero")]
    InvalidBudget,
    #[error("Invalid {field}: {message}")]
    InvalidFieldValue { field: String, message: String },
    #[error("Invalid TOML: {0}")]
    InvalidToml(String),
}

/// Convenience check used wherever external numbers enter the core.
pub(crate) fn ensure_finite(body: &str, field: &str, value: f64) -> Result<f64, DataError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DataError::NonFinite {
            body: body.to_string(),
            field: field.to_string(),
            value,
        })
    }
}
