//! Vehicle speed update - resistance first, then drive, braking and slip.

use crate::components::*;
use crate::config::DrivetrainConfig;
use crate::systems::clock::DeltaTime;
use crate::systems::engine::wheel_rpm;
use bevy_ecs::prelude::*;

/// Throttle below this lets the engine brake the vehicle.
const ENGINE_BRAKING_THROTTLE: f32 = 0.05;

/// Clutch pedal below this is engaged enough for engine braking.
const ENGINE_BRAKING_CLUTCH: f32 = 0.5;

/// System that applies resistance, engine drive, engine braking and clutch slip drag to speed.
pub fn speed_update_system(
    dt: Res<DeltaTime>,
    config: Res<DrivetrainConfig>,
    mut state: ResMut<DrivetrainState>,
) {
    let delta = dt.0;
    let nominal_ticks = delta / config.nominal_tick_seconds;
    let mut speed = state.speed;

    speed *= config.rolling_resistance.powf(nominal_ticks);
    speed = (speed - speed * speed * config.air_resistance * delta).max(0.0);

    let Some(gear_direction) = state.gear.direction() else {
        state.speed = speed;
        return;
    };
    let ratio = config.gear_ratios.ratio(state.gear).unwrap_or(0.0);

    // A vehicle at rest goes whichever way the gear drives it
    if speed == 0.0 {
        state.direction = gear_direction;
    }

    let engagement = state.clutch_engagement();
    if engagement > config.drive_engagement_threshold {
        let sign = if gear_direction == state.direction { 1.0 } else { -1.0 };
        let gear_number = state.gear.magnitude().unwrap_or(1) as f32;
        let efficiency = 1.0 + config.low_gear_bonus / gear_number;
        let drive = state.throttle * config.throttle_torque_scale + config.idle_torque;

        speed += config.torque_factor(state.rpm)
            * drive
            * sign
            * engagement
            * ratio
            * delta
            * config.power_transfer
            * config.acceleration
            * efficiency;
    }

    if state.throttle < ENGINE_BRAKING_THROTTLE && state.clutch < ENGINE_BRAKING_CLUTCH {
        speed *= config.engine_braking.powf(nominal_ticks);
    }

    let partially_engaged = state.clutch >= config.clutch_engaged_threshold
        && state.clutch <= config.clutch_disengaged_threshold;
    if partially_engaged {
        let slip = (state.rpm - wheel_rpm(&config, &state)).abs();
        if slip > config.slip_rpm_threshold {
            let disengagement = state.clutch_disengagement();
            speed -= config.slip_drag
                * slip
                * engagement
                * disengagement
                * (1.0 - state.throttle * config.slip_throttle_relief)
                * delta;
        }
    }

    state.speed = speed.max(0.0);
}
