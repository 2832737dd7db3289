//! Public API for the simulation.
//!
//! This module provides the main interface for a presentation layer (or any
//! other client) to drive the simulation.
//!
//! ## Variable Timestep
//!
//! The caller measures wall-clock time between ticks and hands it to
//! `tick(elapsed)`, or lets `tick_at`/`tick_now` measure it. Elapsed time is
//! clamped to `max_tick_seconds` so a stalled scheduler never produces a
//! runaway integration step. Per-tick decay coefficients are rescaled to the
//! elapsed time, so behaviour does not depend on the tick rate.
//!
//! ## Inputs
//!
//! Pedal setters clamp to `[0, 1]` and take effect on the next tick. Gear
//! changes are gated on a pressed clutch and a running engine; a rejected
//! shift is a silent no-op reported through the return value.

use crate::components::*;
use crate::config::DrivetrainConfig;
use crate::error::ConfigError;
use crate::gearing::{Gear, ShiftHint};
use crate::noise::{IdleNoise, IdleNoiseSource};
use crate::systems::*;
use crate::world::DrivetrainSnapshot;
use bevy_ecs::prelude::*;
use std::time::Instant;
use tracing::{debug, info, trace};

/// The drivetrain simulator.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Starting and stopping the engine
/// - Feeding pedal and gear inputs
/// - Stepping the simulation forward
/// - Extracting state snapshots
pub struct Drivetrain {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
}

impl Drivetrain {
    /// Create a simulator with the default configuration and no idle jitter.
    pub fn new() -> Self {
        Self::build(DrivetrainConfig::default())
    }

    /// Create a simulator with a custom configuration.
    pub fn with_config(config: DrivetrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Replace the idle jitter source.
    pub fn with_noise(mut self, noise: Box<dyn IdleNoise>) -> Self {
        self.world.insert_resource(IdleNoiseSource(noise));
        self
    }

    fn build(config: DrivetrainConfig) -> Self {
        let mut world = World::new();

        world.insert_resource(DeltaTime(0.0));
        world.insert_resource(SimTick(0));
        world.insert_resource(TickOutcome::default());
        world.insert_resource(DrivetrainState::default());
        world.insert_resource(IdleNoiseSource::default());
        world.insert_resource(config);

        // Gate first; the physics pair only runs when the gate leaves the tick Running
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                stall_check_system,
                restart_system,
                (rpm_update_system, speed_update_system)
                    .chain()
                    .run_if(drivetrain_running),
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
        }
    }

    fn state_mut(&mut self) -> Mut<'_, DrivetrainState> {
        self.world.resource_mut::<DrivetrainState>()
    }

    // ------------------------------------------------------------------
    // Engine lifecycle
    // ------------------------------------------------------------------

    pub fn start_engine(&mut self) {
        let idle = self.config().idle_rpm;
        self.state_mut().start_engine(idle);
        info!(idle_rpm = idle, "engine started");
    }

    /// Switch the engine off. The vehicle keeps rolling; only the engine stops.
    pub fn stop_engine(&mut self) {
        self.state_mut().stop_engine();
        info!(speed = self.speed(), "engine stopped");
    }

    pub fn toggle_engine(&mut self) {
        if self.is_engine_running() {
            self.stop_engine();
        } else {
            self.start_engine();
        }
    }

    /// Restore the initial state: engine off, neutral, clutch pressed, at rest.
    pub fn reset(&mut self) {
        self.world.insert_resource(DrivetrainState::default());
        self.world.insert_resource(TickOutcome::default());
        self.world.insert_resource(SimTick(0));
        self.tick = 0;
        self.time = 0.0;
        info!("drivetrain reset");
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Whether a gear change would be accepted right now.
    pub fn can_shift(&self) -> bool {
        let state = self.state();
        state.engine_running
            && !state.stalled
            && state.clutch > self.config().clutch_disengaged_threshold
    }

    /// Select a gear (-1 reverse, 0 neutral, 1..=5 forward).
    ///
    /// Returns `false` and leaves the gear unchanged when the gear is out of
    /// range, the engine is off or stalled, or the clutch is not pressed.
    pub fn set_gear(&mut self, gear: i32) -> bool {
        let target = match Gear::try_from(gear) {
            Ok(target) => target,
            Err(reason) => {
                debug!(gear, %reason, "shift rejected");
                return false;
            }
        };
        if !self.can_shift() {
            let state = self.state();
            debug!(
                gear = %target,
                clutch = state.clutch,
                running = state.engine_running,
                stalled = state.stalled,
                "shift rejected"
            );
            return false;
        }

        let mut state = self.state_mut();
        let from = state.gear;
        state.gear = target;
        debug!(from = %from, to = %target, "shifted");
        true
    }

    /// Set the clutch pedal (0 = engaged, 1 = pressed). NaN is ignored.
    pub fn set_clutch(&mut self, position: f32) {
        if let Some(position) = unit_input(position, "clutch") {
            self.state_mut().clutch = position;
        }
    }

    /// Set the throttle pedal (0 = closed, 1 = wide open). NaN is ignored.
    pub fn set_throttle(&mut self, position: f32) {
        if let Some(position) = unit_input(position, "throttle") {
            self.state_mut().throttle = position;
        }
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Advance the simulation by `elapsed_seconds` of wall-clock time.
    pub fn tick(&mut self, elapsed_seconds: f32) -> TickOutcome {
        if !self.is_engine_running() {
            trace!("tick skipped, engine off");
            return TickOutcome::EngineOff;
        }

        let max = self.config().max_tick_seconds;
        let dt = clamp_elapsed(elapsed_seconds, max);
        if dt != elapsed_seconds {
            debug!(elapsed = elapsed_seconds, clamped = dt, "elapsed time clamped");
        }

        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.world.resource_mut::<SimTick>().increment();
        *self.world.resource_mut::<TickOutcome>() = TickOutcome::Running;

        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt;

        let outcome = *self.world.resource::<TickOutcome>();
        let state = self.state();
        debug_assert!(
            state.invariants_hold(self.config().max_rpm),
            "drivetrain invariants violated: {:?}",
            state
        );
        trace!(
            tick = self.tick,
            ?outcome,
            rpm = state.rpm,
            speed = state.speed,
            gear = %state.gear,
            "tick"
        );
        outcome
    }

    /// Tick using the wall-clock time since the previous measured tick.
    /// The first measured tick after start covers no time.
    pub fn tick_at(&mut self, now: Instant) -> TickOutcome {
        let elapsed = {
            let mut state = self.state_mut();
            let elapsed = state
                .last_tick_at
                .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f32());
            state.last_tick_at = Some(now);
            elapsed
        };
        self.tick(elapsed)
    }

    pub fn tick_now(&mut self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> &DrivetrainState {
        self.world.resource::<DrivetrainState>()
    }

    pub fn config(&self) -> &DrivetrainConfig {
        self.world.resource::<DrivetrainConfig>()
    }

    pub fn rpm(&self) -> f32 {
        self.state().rpm
    }

    pub fn speed(&self) -> f32 {
        self.state().speed
    }

    pub fn gear(&self) -> Gear {
        self.state().gear
    }

    pub fn clutch(&self) -> f32 {
        self.state().clutch
    }

    pub fn throttle(&self) -> f32 {
        self.state().throttle
    }

    pub fn is_stalled(&self) -> bool {
        self.state().stalled
    }

    pub fn is_engine_running(&self) -> bool {
        self.state().engine_running
    }

    pub fn direction(&self) -> TravelDirection {
        self.state().direction
    }

    pub fn status(&self) -> EngineStatus {
        self.state().status()
    }

    pub fn shift_hint(&self) -> ShiftHint {
        self.snapshot().shift_hint
    }

    /// Rpm the wheels imply through the selected gear.
    pub fn wheel_rpm(&self) -> f32 {
        wheel_rpm(self.config(), self.state())
    }

    /// Get the current simulation tick.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the current simulation time in seconds.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&self) -> DrivetrainSnapshot {
        DrivetrainSnapshot::capture(self.state(), self.config(), self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for Drivetrain {
    fn default() -> Self {
        Self::new()
    }
}

fn unit_input(position: f32, pedal: &'static str) -> Option<f32> {
    if position.is_nan() {
        debug!(pedal, "ignoring NaN pedal input");
        return None;
    }
    let clamped = position.clamp(0.0, 1.0);
    if clamped != position {
        debug!(pedal, requested = position, clamped, "pedal input clamped");
    }
    Some(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::SeededNoise;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    const DT: f32 = 0.016;

    fn running() -> Drivetrain {
        let mut sim = Drivetrain::new();
        sim.start_engine();
        sim
    }

    /// Start, shift into `gear` with the clutch pressed, then drop the clutch.
    fn in_gear(gear: i32, throttle: f32) -> Drivetrain {
        let mut sim = running();
        assert!(sim.set_gear(gear));
        sim.set_clutch(0.0);
        sim.set_throttle(throttle);
        sim
    }

    #[test]
    fn test_new_drivetrain() {
        let sim = Drivetrain::new();
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.rpm(), 0.0);
        assert_eq!(sim.speed(), 0.0);
        assert_eq!(sim.gear(), Gear::NEUTRAL);
        assert_eq!(sim.clutch(), 1.0);
        assert_eq!(sim.throttle(), 0.0);
        assert_eq!(sim.status(), EngineStatus::Off);
        assert_eq!(sim.direction(), TravelDirection::Forward);
    }

    #[test]
    fn test_start_and_stop() {
        let mut sim = running();
        assert!(sim.is_engine_running());
        assert_eq!(sim.rpm(), 800.0);
        assert!(!sim.is_stalled());

        sim.stop_engine();
        assert!(!sim.is_engine_running());
        assert_eq!(sim.rpm(), 0.0);

        sim.toggle_engine();
        assert!(sim.is_engine_running());
        sim.toggle_engine();
        sim.toggle_engine();
        assert!(sim.is_engine_running());
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = DrivetrainConfig {
            max_rpm: 700.0,
            ..Default::default()
        };
        assert!(matches!(Drivetrain::with_config(config), Err(ConfigError::RpmLimits(_))));

        let config = DrivetrainConfig {
            idle_jitter_rpm: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            Drivetrain::with_config(config),
            Err(ConfigError::NonFinite { name: "idle_jitter_rpm", .. })
        ));

        let config = DrivetrainConfig {
            air_resistance: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            Drivetrain::with_config(config),
            Err(ConfigError::NonFinite { name: "air_resistance", .. })
        ));

        let config = DrivetrainConfig {
            idle_rpm: 900.0,
            ..Default::default()
        };
        let mut sim = Drivetrain::with_config(config).unwrap();
        sim.start_engine();
        assert_eq!(sim.rpm(), 900.0);
    }

    #[test]
    fn test_idle_is_stable() {
        let mut sim = running();
        for _ in 0..2000 {
            sim.tick(DT);
            assert!((sim.rpm() - 800.0).abs() <= 50.0);
        }
        assert_eq!(sim.speed(), 0.0);
    }

    #[test]
    fn test_seeded_idle_jitters_within_band() {
        let mut sim = Drivetrain::new().with_noise(Box::new(SeededNoise::new(11)));
        sim.start_engine();
        let mut moved = false;
        for _ in 0..2000 {
            sim.tick(DT);
            assert!((sim.rpm() - 800.0).abs() <= 110.0);
            moved |= sim.rpm() != 800.0;
        }
        assert!(moved);
    }

    #[test]
    fn test_stall_under_load() {
        let mut sim = in_gear(1, 0.0);
        let mut stalled_at = None;
        for i in 0..100 {
            if sim.tick(DT) == TickOutcome::Stalled {
                stalled_at = Some(i);
                break;
            }
        }
        assert!(stalled_at.is_some());
        assert!(sim.is_stalled());
        assert_eq!(sim.rpm(), 0.0);
        assert_eq!(sim.status(), EngineStatus::Stalled);
        assert!(sim.is_engine_running());
    }

    #[test]
    fn test_stalled_engine_is_frozen() {
        let mut sim = in_gear(1, 0.0);
        while sim.tick(DT) != TickOutcome::Stalled {}
        let speed = sim.speed();

        sim.set_throttle(1.0);
        sim.set_clutch(0.5);
        for _ in 0..10 {
            assert_eq!(sim.tick(DT), TickOutcome::Frozen);
        }
        assert_eq!(sim.rpm(), 0.0);
        assert_eq!(sim.speed(), speed);
    }

    #[test]
    fn test_restart_recovery() {
        let mut sim = in_gear(1, 0.0);
        while sim.tick(DT) != TickOutcome::Stalled {}

        sim.set_clutch(1.0);
        assert_eq!(sim.tick(DT), TickOutcome::Restarted);
        assert!(!sim.is_stalled());
        assert_eq!(sim.rpm(), 800.0);

        assert_eq!(sim.tick(DT), TickOutcome::Running);
    }

    #[test]
    fn test_shift_gating() {
        let mut sim = Drivetrain::new();
        assert!(!sim.set_gear(1), "engine off");

        sim.start_engine();
        sim.set_clutch(0.5);
        assert!(!sim.can_shift());
        assert!(!sim.set_gear(1));
        assert_eq!(sim.gear(), Gear::NEUTRAL);

        // The disengaged threshold itself is still too much engagement
        sim.set_clutch(0.8);
        assert!(!sim.can_shift());
        assert!(!sim.set_gear(1));
        assert_eq!(sim.gear(), Gear::NEUTRAL);

        sim.set_clutch(0.9);
        assert!(sim.can_shift());
        assert!(sim.set_gear(1));
        assert_eq!(sim.gear().as_i32(), 1);

        assert!(!sim.set_gear(6));
        assert!(!sim.set_gear(-2));
        assert_eq!(sim.gear().as_i32(), 1);

        assert!(sim.set_gear(-1));
        assert_eq!(sim.gear(), Gear::REVERSE);
        assert!(sim.set_gear(0));
    }

    #[test]
    fn test_no_shift_while_stalled() {
        let mut sim = in_gear(1, 0.0);
        while sim.tick(DT) != TickOutcome::Stalled {}
        // Pressing the clutch alone does not restart until the next tick
        sim.set_clutch(1.0);
        assert!(!sim.set_gear(2));
        sim.tick(DT);
        assert!(sim.set_gear(2));
    }

    #[test]
    fn test_shift_keeps_rpm() {
        let mut sim = running();
        sim.set_throttle(0.5);
        for _ in 0..20 {
            sim.tick(DT);
        }
        let rpm = sim.rpm();
        assert!(sim.set_gear(3));
        assert_eq!(sim.rpm(), rpm);
    }

    #[test]
    fn test_pedal_inputs_clamp() {
        let mut sim = Drivetrain::new();
        sim.set_clutch(2.0);
        assert_eq!(sim.clutch(), 1.0);
        sim.set_clutch(-0.5);
        assert_eq!(sim.clutch(), 0.0);
        sim.set_throttle(1.5);
        assert_eq!(sim.throttle(), 1.0);

        sim.set_throttle(f32::NAN);
        assert_eq!(sim.throttle(), 1.0);
        sim.set_clutch(f32::NAN);
        assert_eq!(sim.clutch(), 0.0);
    }

    #[test]
    fn test_pull_away_in_first() {
        let mut sim = in_gear(1, 0.5);
        for _ in 0..300 {
            sim.tick(DT);
        }

        assert!(!sim.is_stalled());
        assert!(sim.speed() > 0.0);
        let wheel = sim.wheel_rpm();
        assert!(wheel > 0.0);
        assert!((sim.rpm() - wheel).abs() < wheel * 0.1);
        assert_eq!(sim.direction(), TravelDirection::Forward);
    }

    #[test]
    fn test_engine_off_tick_is_noop() {
        let mut sim = in_gear(1, 0.5);
        for _ in 0..100 {
            sim.tick(DT);
        }
        let speed = sim.speed();
        assert!(speed > 0.0);

        sim.stop_engine();
        assert_eq!(sim.speed(), speed);
        let tick = sim.current_tick();
        for _ in 0..10 {
            assert_eq!(sim.tick(DT), TickOutcome::EngineOff);
        }
        assert_eq!(sim.rpm(), 0.0);
        assert_eq!(sim.speed(), speed);
        assert_eq!(sim.current_tick(), tick);
    }

    #[test]
    fn test_elapsed_is_clamped() {
        let mut a = in_gear(1, 0.8);
        let mut b = in_gear(1, 0.8);
        a.tick(10.0);
        b.tick(0.1);
        assert_eq!(a.snapshot(), b.snapshot());
        assert!((a.current_time() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_nan_elapsed_counts_as_no_time() {
        let mut sim = running();
        sim.set_throttle(1.0);
        assert_eq!(sim.tick(f32::NAN), TickOutcome::Running);
        assert_eq!(sim.current_tick(), 1);
        assert_eq!(sim.current_time(), 0.0);
        assert_eq!(sim.rpm(), 800.0);
    }

    #[test]
    fn test_reverse_moves_backwards() {
        let mut sim = running();
        assert!(sim.set_gear(-1));
        sim.set_throttle(0.4);
        for i in 0..120 {
            sim.set_clutch((1.0 - i as f32 / 60.0).max(0.0));
            sim.tick(DT);
        }

        assert!(!sim.is_stalled());
        assert!(sim.speed() > 1.0);
        assert_eq!(sim.direction(), TravelDirection::Reverse);
        assert_eq!(sim.shift_hint(), ShiftHint::Hold);
    }

    #[test]
    fn test_opposite_gear_decelerates() {
        let mut braking = in_gear(1, 0.5);
        for _ in 0..300 {
            braking.tick(DT);
        }
        braking.set_throttle(0.0);
        braking.set_clutch(1.0);
        assert!(braking.set_gear(-1));

        let mut coasting = in_gear(1, 0.5);
        for _ in 0..300 {
            coasting.tick(DT);
        }
        coasting.set_throttle(0.0);
        coasting.set_clutch(1.0);
        assert!(coasting.set_gear(0));

        braking.set_clutch(0.0);
        for _ in 0..30 {
            braking.tick(DT);
            coasting.tick(DT);
        }
        assert!(braking.speed() < coasting.speed());
        assert_eq!(braking.direction(), TravelDirection::Forward);
    }

    #[test]
    fn test_bounds_hold_under_random_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xD41E);
        let mut sim = Drivetrain::new().with_noise(Box::new(SeededNoise::new(5)));
        sim.start_engine();

        for _ in 0..5000 {
            match rng.gen_range(0..10) {
                0 => sim.set_clutch(rng.gen_range(-0.2..1.2)),
                1 => sim.set_throttle(rng.gen_range(-0.2..1.2)),
                2 => {
                    sim.set_gear(rng.gen_range(-2..7));
                }
                3 if rng.gen_bool(0.02) => sim.toggle_engine(),
                _ => {}
            }
            sim.tick(rng.gen_range(0.0..0.2));

            let state = sim.state();
            assert!(state.invariants_hold(8000.0), "{:?}", state);
            assert!(sim.speed() >= 0.0);
            assert!((0.0..=8000.0).contains(&sim.rpm()));
        }
    }

    #[test]
    fn test_tick_at_measures_elapsed() {
        let mut sim = running();
        let start = Instant::now();

        sim.tick_at(start);
        assert_eq!(sim.current_time(), 0.0);

        sim.tick_at(start + Duration::from_millis(16));
        assert!((sim.current_time() - 0.016).abs() < 1e-4);

        sim.tick_at(start + Duration::from_secs(5));
        assert!((sim.current_time() - 0.116).abs() < 1e-4);

        // A mark earlier than the last one counts as no time
        sim.tick_at(start);
        assert!((sim.current_time() - 0.116).abs() < 1e-4);
        assert_eq!(sim.current_tick(), 4);
    }

    #[test]
    fn test_restart_clears_tick_mark() {
        let mut sim = running();
        let start = Instant::now();
        sim.tick_at(start);
        sim.stop_engine();
        sim.start_engine();

        sim.tick_at(start + Duration::from_secs(1));
        assert_eq!(sim.current_time(), 0.0);
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut sim = in_gear(2, 0.7);
        for _ in 0..50 {
            sim.tick(DT);
        }
        sim.reset();

        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.current_time(), 0.0);
        assert_eq!(sim.state().rpm, 0.0);
        assert_eq!(sim.speed(), 0.0);
        assert_eq!(sim.gear(), Gear::NEUTRAL);
        assert_eq!(sim.clutch(), 1.0);
        assert_eq!(sim.status(), EngineStatus::Off);
    }

    #[test]
    fn test_shift_hint_follows_band() {
        let mut sim = running();
        sim.set_throttle(1.0);
        assert!(sim.set_gear(1));
        for _ in 0..200 {
            sim.tick(DT);
        }
        // Clutch pressed, revving past first gear's band
        assert!(sim.rpm() > 4000.0);
        assert_eq!(sim.shift_hint(), ShiftHint::Upshift);
    }

    #[test]
    fn test_snapshot_json() {
        let mut sim = running();
        sim.tick(DT);
        let json = sim.snapshot_json();
        assert!(json.contains("\"rpm\":800.0"));
        assert!(json.contains("\"status\":\"Running\""));
        assert!(json.contains("\"tick\":1"));
    }
}
