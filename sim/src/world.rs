//! Read model of the simulation.
//!
//! The `DrivetrainSnapshot` struct provides a serializable view of the
//! drivetrain that a presentation layer can render without touching the world.

use crate::components::*;
use crate::config::DrivetrainConfig;
use crate::gearing::{Gear, ShiftHint};
use crate::systems::wheel_rpm;
use serde::{Deserialize, Serialize};

/// Complete drivetrain state snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivetrainSnapshot {
    /// Number of ticks that ran the schedule.
    pub tick: u64,
    /// Accumulated (clamped) simulation time in seconds.
    pub time: f32,
    pub rpm: f32,
    pub speed: f32,
    /// Rpm the wheels imply through the selected gear.
    pub wheel_rpm: f32,
    pub gear: Gear,
    pub clutch: f32,
    pub throttle: f32,
    pub stalled: bool,
    pub engine_running: bool,
    pub status: EngineStatus,
    pub direction: TravelDirection,
    pub shift_hint: ShiftHint,
}

impl DrivetrainSnapshot {
    /// Capture the current state.
    pub fn capture(state: &DrivetrainState, config: &DrivetrainConfig, tick: u64, time: f32) -> Self {
        let shift_hint = if state.engine_running && !state.stalled {
            ShiftHint::evaluate(&config.gear_ratios, state.gear, state.rpm)
        } else {
            ShiftHint::Hold
        };

        Self {
            tick,
            time,
            rpm: state.rpm,
            speed: state.speed,
            wheel_rpm: wheel_rpm(config, state),
            gear: state.gear,
            clutch: state.clutch,
            throttle: state.throttle,
            stalled: state.stalled,
            engine_running: state.engine_running,
            status: state.status(),
            direction: state.direction,
            shift_hint,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot received as JSON text or bytes, e.g. by a remote display.
    /// Gears outside -1..=5 are rejected.
    pub fn from_json(data: impl AsRef<[u8]>) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data.as_ref())
    }
}
