//! Engine rpm update.
//!
//! RPM is target-seeking. Which target it chases depends on how much of the
//! wheels the clutch lets it feel:
//! - neutral / clutch pressed: free revving toward the throttle target
//! - clutch locked: dragged to wheel rpm, plus a small throttle boost
//! - partial: a blend of being pulled to the wheels and pushed by the throttle

use crate::components::*;
use crate::config::DrivetrainConfig;
use crate::noise::IdleNoiseSource;
use crate::systems::clock::DeltaTime;
use bevy_ecs::prelude::*;

/// Throttle below this counts as "off the gas" for idle jitter.
const IDLE_THROTTLE_EPSILON: f32 = 0.01;

/// How strongly throttle resists the wheels pulling rpm down under partial engagement.
const PARTIAL_THROTTLE_RESISTANCE: f32 = 0.5;

/// How strongly throttle pushes rpm toward its target under partial engagement.
const PARTIAL_THROTTLE_PUSH: f32 = 0.5;

/// Rpm implied by the current wheel speed through the selected gear.
/// Zero in neutral; reverse uses the magnitude of its ratio.
pub fn wheel_rpm(config: &DrivetrainConfig, state: &DrivetrainState) -> f32 {
    config
        .gear_ratios
        .ratio(state.gear)
        .map_or(0.0, |ratio| state.speed * config.speed_to_rpm_factor * ratio)
}

/// System that moves engine rpm toward whatever the clutch couples it to.
pub fn rpm_update_system(
    dt: Res<DeltaTime>,
    config: Res<DrivetrainConfig>,
    mut noise: ResMut<IdleNoiseSource>,
    mut state: ResMut<DrivetrainState>,
) {
    let delta = dt.0;
    let target = config.engine_target_rpm(state.throttle);
    let inertia_step = (config.engine_inertia * delta).min(1.0);
    let mut rpm = state.rpm;

    if state.gear.is_neutral() || state.clutch > config.clutch_disengaged_threshold {
        rpm += (target - rpm) * inertia_step;
    } else {
        let wheel = wheel_rpm(&config, &state);
        if state.clutch < config.clutch_engaged_threshold {
            let lock_step = (config.clutch_lock_rate * delta).min(1.0);
            let boost = (state.throttle * config.throttle_boost_rpm * delta)
                .min(config.throttle_boost_cap);
            rpm += (wheel - rpm) * lock_step + boost;
        } else {
            let disengagement = state.clutch_disengagement();
            let pull = (wheel - rpm)
                * (1.0 - disengagement)
                * (1.0 - state.throttle * PARTIAL_THROTTLE_RESISTANCE);
            let push = (target - rpm) * (disengagement + state.throttle * PARTIAL_THROTTLE_PUSH);
            rpm += (pull + push) * inertia_step;
        }
    }

    if state.throttle < IDLE_THROTTLE_EPSILON && (rpm - config.idle_rpm).abs() < config.idle_jitter_band {
        rpm += noise.sample() * config.idle_jitter_rpm;
    }

    state.rpm = rpm.clamp(0.0, config.max_rpm);
}
