//! Stall and restart handling.
//!
//! These run first each tick. Either can end the tick early by moving
//! [`TickOutcome`] away from `Running`, which gates the rpm and speed systems.

use crate::components::*;
use crate::config::DrivetrainConfig;
use bevy_ecs::prelude::*;
use tracing::info;

/// Stalls the engine when it is coupled to the wheels below the stall floor.
pub fn stall_check_system(
    config: Res<DrivetrainConfig>,
    mut state: ResMut<DrivetrainState>,
    mut outcome: ResMut<TickOutcome>,
) {
    if state.stalled || state.gear.is_neutral() {
        return;
    }
    if state.clutch_disengagement() >= config.stall_engagement_threshold {
        return;
    }
    let floor = config.stall_floor(state.throttle);
    if state.rpm < floor {
        info!(gear = %state.gear, rpm = state.rpm, floor, "engine stalled");
        state.stall();
        *outcome = TickOutcome::Stalled;
    }
}

/// Restarts a stalled engine once the clutch pedal is pressed.
///
/// The restart tick only resets rpm to idle; normal updates resume on the
/// following tick.
pub fn restart_system(
    config: Res<DrivetrainConfig>,
    mut state: ResMut<DrivetrainState>,
    mut outcome: ResMut<TickOutcome>,
) {
    if *outcome != TickOutcome::Running || !state.stalled {
        return;
    }
    if state.clutch > config.clutch_disengaged_threshold {
        info!(gear = %state.gear, "engine restarted");
        state.stalled = false;
        state.rpm = config.idle_rpm;
        *outcome = TickOutcome::Restarted;
    } else {
        *outcome = TickOutcome::Frozen;
    }
}

/// Run condition: the tick survived the stall and restart checks.
pub fn drivetrain_running(outcome: Res<TickOutcome>) -> bool {
    *outcome == TickOutcome::Running
}
