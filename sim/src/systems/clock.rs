//! Per-tick timing resources.

use bevy_ecs::prelude::*;

/// Resource containing the (clamped) delta time for the current tick.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct DeltaTime(pub f32);

/// Global simulation tick counter.
/// Increments each tick that runs the schedule.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Clamp a caller-measured elapsed time into `[0, max]`. NaN counts as no time.
pub fn clamp_elapsed(elapsed: f32, max: f32) -> f32 {
    if elapsed.is_nan() {
        0.0
    } else {
        elapsed.clamp(0.0, max)
    }
}
