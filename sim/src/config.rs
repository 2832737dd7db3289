//! Tunable constants for the drivetrain simulation.
//!
//! Every coefficient the tick algorithm uses lives in [`DrivetrainConfig`] so
//! that tests and embedders can calibrate behaviour without touching the
//! systems. Configs can be loaded from TOML or JSON; missing keys fall back
//! to the defaults below.

use crate::error::ConfigError;
use crate::gearing::GearRatioTable;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One point on the torque curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorquePoint {
    pub rpm: f32,
    pub factor: f32,
}

/// Piecewise-linear torque factor over engine rpm.
///
/// Low near idle, rising through the low band, a mid-range plateau, then
/// falling off towards the limiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TorqueCurve {
    points: Vec<TorquePoint>,
}

impl Default for TorqueCurve {
    fn default() -> Self {
        Self::from_pairs(&[
            (0.0, 0.3),
            (1000.0, 0.5),
            (2500.0, 0.9),
            (3500.0, 1.0),
            (5000.0, 1.0),
            (7000.0, 0.7),
            (8000.0, 0.5),
        ])
    }
}

impl TorqueCurve {
    pub fn from_pairs(pairs: &[(f32, f32)]) -> Self {
        Self {
            points: pairs
                .iter()
                .map(|&(rpm, factor)| TorquePoint { rpm, factor })
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points.is_empty() {
            return Err(ConfigError::EmptyTorqueCurve);
        }
        for point in &self.points {
            for value in [point.rpm, point.factor] {
                if !value.is_finite() {
                    return Err(ConfigError::NonFinite { name: "torque_curve", value });
                }
            }
        }
        for (index, pair) in self.points.windows(2).enumerate() {
            if !(pair[1].rpm > pair[0].rpm) {
                return Err(ConfigError::UnsortedTorqueCurve { index: index + 1 });
            }
        }
        Ok(())
    }

    /// Interpolated factor at `rpm`, held flat outside the first/last points.
    pub fn factor_at(&self, rpm: f32) -> f32 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if rpm <= first.rpm {
            return first.factor;
        }
        if rpm >= last.rpm {
            return last.factor;
        }
        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if rpm <= hi.rpm {
                let t = (rpm - lo.rpm) / (hi.rpm - lo.rpm);
                return lo.factor + (hi.factor - lo.factor) * t;
            }
        }
        last.factor
    }
}

/// Configuration for the drivetrain simulation.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    // --- Engine ---
    /// Idle speed the engine settles at with no throttle.
    pub idle_rpm: f32,
    /// Engine stalls below this (throttle-adjusted) while coupled to the wheels.
    pub stall_rpm: f32,
    /// Rev limit.
    pub max_rpm: f32,
    /// How fast rpm chases its free-running target (per second).
    pub engine_inertia: f32,
    /// How fast rpm follows wheel rpm with the clutch fully engaged (per second).
    pub clutch_lock_rate: f32,
    /// Extra rpm per second at full throttle with the clutch locked.
    pub throttle_boost_rpm: f32,
    /// Cap on the locked-clutch throttle boost per tick.
    pub throttle_boost_cap: f32,
    /// Idle fluctuation amplitude.
    pub idle_jitter_rpm: f32,
    /// Jitter only applies within this distance of idle.
    pub idle_jitter_band: f32,
    pub torque_curve: TorqueCurve,

    // --- Clutch ---
    /// Pedal position above which the clutch counts as disengaged (shifting allowed).
    pub clutch_disengaged_threshold: f32,
    /// Pedal position below which the clutch counts as locked.
    pub clutch_engaged_threshold: f32,
    /// Stall check fires when clutch² is below this.
    pub stall_engagement_threshold: f32,

    // --- Gearbox / wheels ---
    pub gear_ratios: GearRatioTable,
    /// Wheel-implied rpm per unit of speed per unit of gear ratio.
    pub speed_to_rpm_factor: f32,

    // --- Power transfer ---
    pub power_transfer: f32,
    pub acceleration: f32,
    /// Torque delivered with the throttle closed.
    pub idle_torque: f32,
    pub throttle_torque_scale: f32,
    /// Efficiency bonus divided by gear number; favours low gears.
    pub low_gear_bonus: f32,
    /// Minimum engagement (1 - clutch²) before any drive reaches the wheels.
    pub drive_engagement_threshold: f32,

    // --- Resistance ---
    /// Multiplicative decay per nominal tick.
    pub rolling_resistance: f32,
    /// Quadratic drag coefficient.
    pub air_resistance: f32,
    /// Multiplicative decay per nominal tick when coasting in gear.
    pub engine_braking: f32,
    /// RPM gap above which a slipping clutch drags on the vehicle.
    pub slip_rpm_threshold: f32,
    pub slip_drag: f32,
    /// How much throttle reduces slip drag.
    pub slip_throttle_relief: f32,

    // --- Timing ---
    /// Tick length the per-tick decay coefficients are expressed in.
    pub nominal_tick_seconds: f32,
    /// Elapsed time is clamped to this to survive scheduling hiccups.
    pub max_tick_seconds: f32,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            idle_rpm: 800.0,
            stall_rpm: 600.0,
            max_rpm: 8000.0,
            engine_inertia: 8.0,
            clutch_lock_rate: 3.0,
            throttle_boost_rpm: 1500.0,
            throttle_boost_cap: 30.0,
            idle_jitter_rpm: 10.0,
            idle_jitter_band: 100.0,
            torque_curve: TorqueCurve::default(),

            clutch_disengaged_threshold: 0.8,
            clutch_engaged_threshold: 0.2,
            stall_engagement_threshold: 0.04,

            gear_ratios: GearRatioTable::default(),
            speed_to_rpm_factor: 30.0,

            power_transfer: 0.5,
            acceleration: 16.0,
            idle_torque: 0.15,
            throttle_torque_scale: 1.0,
            low_gear_bonus: 0.2,
            drive_engagement_threshold: 0.05,

            rolling_resistance: 0.9995,
            air_resistance: 0.0002,
            engine_braking: 0.998,
            slip_rpm_threshold: 500.0,
            slip_drag: 0.02,
            slip_throttle_relief: 0.7,

            nominal_tick_seconds: 0.016,
            max_tick_seconds: 0.1,
        }
    }
}

impl DrivetrainConfig {
    /// Parse and validate a TOML config. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON config. Missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a `.toml` or `.json` config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.scalars() {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }

        if !(0.0 < self.stall_rpm && self.stall_rpm < self.idle_rpm && self.idle_rpm < self.max_rpm) {
            return Err(ConfigError::RpmLimits(format!(
                "expected 0 < stall ({}) < idle ({}) < max ({})",
                self.stall_rpm, self.idle_rpm, self.max_rpm
            )));
        }
        if !(0.0 <= self.clutch_engaged_threshold
            && self.clutch_engaged_threshold < self.clutch_disengaged_threshold
            && self.clutch_disengaged_threshold <= 1.0)
        {
            return Err(ConfigError::ClutchThresholds(format!(
                "expected 0 <= engaged ({}) < disengaged ({}) <= 1",
                self.clutch_engaged_threshold, self.clutch_disengaged_threshold
            )));
        }

        let positive = [
            ("engine_inertia", self.engine_inertia),
            ("clutch_lock_rate", self.clutch_lock_rate),
            ("speed_to_rpm_factor", self.speed_to_rpm_factor),
            ("power_transfer", self.power_transfer),
            ("acceleration", self.acceleration),
            ("nominal_tick_seconds", self.nominal_tick_seconds),
            ("max_tick_seconds", self.max_tick_seconds),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        let non_negative = [
            ("throttle_boost_rpm", self.throttle_boost_rpm),
            ("throttle_boost_cap", self.throttle_boost_cap),
            ("idle_jitter_rpm", self.idle_jitter_rpm),
            ("idle_jitter_band", self.idle_jitter_band),
            ("idle_torque", self.idle_torque),
            ("throttle_torque_scale", self.throttle_torque_scale),
            ("low_gear_bonus", self.low_gear_bonus),
            ("air_resistance", self.air_resistance),
            ("slip_rpm_threshold", self.slip_rpm_threshold),
            ("slip_drag", self.slip_drag),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }

        let unit = [
            ("stall_engagement_threshold", self.stall_engagement_threshold),
            ("drive_engagement_threshold", self.drive_engagement_threshold),
            ("rolling_resistance", self.rolling_resistance),
            ("engine_braking", self.engine_braking),
            ("slip_throttle_relief", self.slip_throttle_relief),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }

        self.gear_ratios.validate()?;
        self.torque_curve.validate()
    }

    /// Every scalar field by name.
    fn scalars(&self) -> [(&'static str, f32); 27] {
        [
            ("idle_rpm", self.idle_rpm),
            ("stall_rpm", self.stall_rpm),
            ("max_rpm", self.max_rpm),
            ("engine_inertia", self.engine_inertia),
            ("clutch_lock_rate", self.clutch_lock_rate),
            ("throttle_boost_rpm", self.throttle_boost_rpm),
            ("throttle_boost_cap", self.throttle_boost_cap),
            ("idle_jitter_rpm", self.idle_jitter_rpm),
            ("idle_jitter_band", self.idle_jitter_band),
            ("clutch_disengaged_threshold", self.clutch_disengaged_threshold),
            ("clutch_engaged_threshold", self.clutch_engaged_threshold),
            ("stall_engagement_threshold", self.stall_engagement_threshold),
            ("speed_to_rpm_factor", self.speed_to_rpm_factor),
            ("power_transfer", self.power_transfer),
            ("acceleration", self.acceleration),
            ("idle_torque", self.idle_torque),
            ("throttle_torque_scale", self.throttle_torque_scale),
            ("low_gear_bonus", self.low_gear_bonus),
            ("drive_engagement_threshold", self.drive_engagement_threshold),
            ("rolling_resistance", self.rolling_resistance),
            ("air_resistance", self.air_resistance),
            ("engine_braking", self.engine_braking),
            ("slip_rpm_threshold", self.slip_rpm_threshold),
            ("slip_drag", self.slip_drag),
            ("slip_throttle_relief", self.slip_throttle_relief),
            ("nominal_tick_seconds", self.nominal_tick_seconds),
            ("max_tick_seconds", self.max_tick_seconds),
        ]
    }

    /// Torque factor at `rpm`; zero at or above the rev limit.
    pub fn torque_factor(&self, rpm: f32) -> f32 {
        if rpm >= self.max_rpm {
            0.0
        } else {
            self.torque_curve.factor_at(rpm)
        }
    }

    /// Free-running rpm the throttle asks for.
    pub fn engine_target_rpm(&self, throttle: f32) -> f32 {
        self.idle_rpm + throttle * (self.max_rpm - self.idle_rpm)
    }

    /// Rpm below which a coupled engine stalls; throttle lowers the floor.
    pub fn stall_floor(&self, throttle: f32) -> f32 {
        self.stall_rpm * (1.0 - (throttle * 0.7).min(0.6))
    }
}
