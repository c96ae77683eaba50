//! Errors raised while loading external configuration.
//!
//! The step function itself never fails; everything that can be wrong with a
//! roster or a parameter bundle is rejected here, once, at the load boundary.

use crate::types::SliderKey;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("occupation roster is empty")]
    EmptyRoster,

    #[error("duplicate occupation key `{0}`")]
    DuplicateOccupation(String),

    #[error("occupation `{occupation}`: {field} = {value} is outside [0, 1]")]
    ScoreOutOfRange {
        occupation: String,
        field: &'static str,
        value: f64,
    },

    #[error("occupation `{occupation}`: baseline {field} must be positive, got {value}")]
    NonPositiveBaseline {
        occupation: String,
        field: &'static str,
        value: f64,
    },

    #[error("labor force {labor_force} is smaller than tracked employment {employment}")]
    LaborForceTooSmall { labor_force: f64, employment: f64 },

    #[error("invalid bounds for {name}: [{min}, {max}]")]
    InvalidBounds { name: &'static str, min: f64, max: f64 },

    #[error("parameter {name} = {value} is out of range")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("no metadata declared for slider `{0}`")]
    MissingSlider(SliderKey),

    #[error("slider `{key}`: {reason}")]
    InvalidSliderSpec { key: SliderKey, reason: String },

    #[error("unknown slider `{0}`")]
    UnknownSlider(String),

    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
}
