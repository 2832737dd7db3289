//! Manual Gearbox - Drivetrain Simulation Core
//!
//! A real-time simulation of a manual-transmission car: clutch, throttle and
//! gear inputs in; engine rpm, vehicle speed and stall state out.
//! Uses `bevy_ecs` to run the per-tick logic as an ordered schedule of systems.

pub mod api;
pub mod components;
pub mod config;
pub mod display_bridge;
pub mod error;
pub mod gearing;
pub mod logging;
pub mod noise;
pub mod shared;
pub mod systems;
pub mod world;

pub use api::Drivetrain;
pub use components::*;
pub use config::{DrivetrainConfig, TorqueCurve, TorquePoint};
pub use error::ConfigError;
pub use gearing::{Gear, GearRatio, GearRatioTable, ShiftHint, FORWARD_GEARS};
pub use noise::{IdleNoise, SeededNoise, SilentNoise};
pub use shared::{spawn_tick_loop, SharedDrivetrain, TickLoop};
pub use world::DrivetrainSnapshot;
