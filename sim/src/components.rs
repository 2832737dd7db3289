//! ECS data for the drivetrain simulation.
//!
//! The simulation holds a single vehicle, so its state is stored as world
//! resources rather than per-entity components. Systems read and write these
//! resources; nothing else mutates them.

use crate::gearing::Gear;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ============================================================================
// SIMULATION STATE
// ============================================================================

/// Direction the vehicle is travelling in. `speed` is always a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelDirection {
    #[default]
    Forward,
    Reverse,
}

/// Coarse engine status for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Off,
    Stalled,
    Running,
}

/// The complete mutable state of the drivetrain.
#[derive(Resource, Debug, Clone)]
pub struct DrivetrainState {
    /// Engine speed (0 ..= max rpm).
    pub rpm: f32,
    /// Vehicle speed magnitude (km/h scaled).
    pub speed: f32,
    pub gear: Gear,
    /// Clutch pedal: 0 = fully engaged, 1 = pressed (disengaged).
    pub clutch: f32,
    /// Throttle pedal: 0 = closed, 1 = wide open.
    pub throttle: f32,
    /// Engine stopped involuntarily.
    pub stalled: bool,
    pub engine_running: bool,
    pub direction: TravelDirection,
    /// Wall-clock mark of the last measured tick.
    pub last_tick_at: Option<Instant>,
}

impl Default for DrivetrainState {
    fn default() -> Self {
        Self {
            rpm: 0.0,
            speed: 0.0,
            gear: Gear::NEUTRAL,
            clutch: 1.0,
            throttle: 0.0,
            stalled: false,
            engine_running: false,
            direction: TravelDirection::Forward,
            last_tick_at: None,
        }
    }
}

impl DrivetrainState {
    pub fn start_engine(&mut self, idle_rpm: f32) {
        self.engine_running = true;
        self.rpm = idle_rpm;
        self.stalled = false;
        self.last_tick_at = None;
    }

    pub fn stop_engine(&mut self) {
        self.engine_running = false;
        self.rpm = 0.0;
        self.stalled = false;
        self.last_tick_at = None;
    }

    pub fn stall(&mut self) {
        self.stalled = true;
        self.rpm = 0.0;
    }

    /// Pedal depression squared; near zero means the clutch is biting hard.
    pub fn clutch_disengagement(&self) -> f32 {
        self.clutch * self.clutch
    }

    /// Fraction of engine torque the clutch passes through.
    pub fn clutch_engagement(&self) -> f32 {
        1.0 - self.clutch_disengagement()
    }

    pub fn status(&self) -> EngineStatus {
        if !self.engine_running {
            EngineStatus::Off
        } else if self.stalled {
            EngineStatus::Stalled
        } else {
            EngineStatus::Running
        }
    }

    /// True when rpm and speed are in range and the stall/run flags agree.
    pub fn invariants_hold(&self, max_rpm: f32) -> bool {
        let rpm_ok = (0.0..=max_rpm).contains(&self.rpm);
        let speed_ok = self.speed >= 0.0;
        let stall_ok = !self.stalled || self.rpm == 0.0;
        let off_ok = self.engine_running || (self.rpm == 0.0 && !self.stalled);
        rpm_ok && speed_ok && stall_ok && off_ok
    }
}

// ============================================================================
// TICK BOOKKEEPING
// ============================================================================

/// Which branch of the tick algorithm ran.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Engine is off; nothing was updated.
    EngineOff,
    /// Engine stalled this tick.
    Stalled,
    /// A stalled engine restarted this tick; rpm/speed update resumes next tick.
    Restarted,
    /// Engine remains stalled; state frozen.
    Frozen,
    /// Normal rpm and speed update.
    #[default]
    Running,
}
