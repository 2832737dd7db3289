//! Errors raised while building or loading a drivetrain configuration.
//!
//! The simulation itself never fails: bad pedal values are clamped and illegal
//! shifts are ignored. Only configuration can be rejected.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported config file extension: {0}")]
    UnsupportedFormat(String),
    #[error("Expected {expected} forward gears, found {found}")]
    GearCount { expected: usize, found: usize },
    #[error("Gear {gear} has non-positive ratio {ratio}")]
    NonPositiveRatio { gear: usize, ratio: f32 },
    #[error("Gear {gear} ratio must be lower than gear {previous}")]
    RatiosNotDecreasing { gear: usize, previous: usize },
    #[error("Gear {gear} has an empty rpm band ({min_rpm}..{max_rpm})")]
    InvalidRpmBand { gear: usize, min_rpm: f32, max_rpm: f32 },
    #[error("Invalid engine rpm limits: {0}")]
    RpmLimits(String),
    #[error("Invalid clutch thresholds: {0}")]
    ClutchThresholds(String),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("{name} must be a finite number, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("Torque curve needs at least one point")]
    EmptyTorqueCurve,
    #[error("Torque curve points must have strictly increasing rpm (index {index})")]
    UnsortedTorqueCurve { index: usize },
}
