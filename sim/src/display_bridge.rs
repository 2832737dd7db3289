//! Display Integration Bridge
//!
//! This module provides the interface between the drivetrain simulation and a
//! foreign presentation layer (a game engine, a web view, a dashboard). It
//! converts a snapshot into an FFI-friendly flat buffer.
//!
//! # Stable FFI Contract
//!
//! The buffer is a contiguous `Vec<f32>` with a fixed layout, so the consumer
//! can read it without allocating or parsing. Field order and count are
//! versioned through the header.
//!
//! # Buffer Layout (Version 1)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (1 element)                                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ [0] format_version (as f32)                                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ DRIVETRAIN DATA (DISPLAY_STRIDE elements, offset = HEADER_SIZE) │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   [+0]  rpm            - Engine speed                           │
//! │   [+1]  speed          - Vehicle speed magnitude                │
//! │   [+2]  wheel_rpm      - Rpm implied by the wheels              │
//! │   [+3]  gear           - -1 reverse, 0 neutral, 1..5            │
//! │   [+4]  clutch         - Pedal (0 engaged, 1 pressed)           │
//! │   [+5]  throttle       - Pedal (0 closed, 1 open)               │
//! │   [+6]  stalled        - 1.0 when stalled                       │
//! │   [+7]  engine_running - 1.0 when running                       │
//! │   [+8]  status         - See STATUS_* constants                 │
//! │   [+9]  direction      - See DIRECTION_* constants              │
//! │   [+10] shift_hint     - See HINT_* constants                   │
//! │   [+11] time           - Simulation time in seconds             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Status Mapping
//!
//! | Status  | ID  |
//! |---------|-----|
//! | Off     | 0.0 |
//! | Stalled | 1.0 |
//! | Running | 2.0 |
//!
//! # Determinism
//!
//! The same `DrivetrainSnapshot` always produces the same buffer.

use crate::components::{EngineStatus, TravelDirection};
use crate::gearing::ShiftHint;
use crate::world::DrivetrainSnapshot;

// ============================================================================
// CONSTANTS - STABLE FFI CONTRACT
// ============================================================================

/// Layout version written to the header. Bump when fields change.
pub const FORMAT_VERSION: u32 = 1;

/// Number of f32 values in the buffer header.
pub const HEADER_SIZE: usize = 1;

/// Number of f32 values of drivetrain data after the header.
///
/// **This is part of the stable FFI contract. Do not change without versioning.**
pub const DISPLAY_STRIDE: usize = 12;

/// Status: engine off
pub const STATUS_OFF: f32 = 0.0;
/// Status: stalled
pub const STATUS_STALLED: f32 = 1.0;
/// Status: running
pub const STATUS_RUNNING: f32 = 2.0;

/// Direction: forward
pub const DIRECTION_FORWARD: f32 = 0.0;
/// Direction: reverse
pub const DIRECTION_REVERSE: f32 = 1.0;

/// Shift hint: hold
pub const HINT_HOLD: f32 = 0.0;
/// Shift hint: upshift
pub const HINT_UPSHIFT: f32 = 1.0;
/// Shift hint: downshift
pub const HINT_DOWNSHIFT: f32 = 2.0;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

#[inline]
pub fn status_to_id(status: EngineStatus) -> f32 {
    match status {
        EngineStatus::Off => STATUS_OFF,
        EngineStatus::Stalled => STATUS_STALLED,
        EngineStatus::Running => STATUS_RUNNING,
    }
}

#[inline]
pub fn direction_to_id(direction: TravelDirection) -> f32 {
    match direction {
        TravelDirection::Forward => DIRECTION_FORWARD,
        TravelDirection::Reverse => DIRECTION_REVERSE,
    }
}

#[inline]
pub fn hint_to_id(hint: ShiftHint) -> f32 {
    match hint {
        ShiftHint::Hold => HINT_HOLD,
        ShiftHint::Upshift => HINT_UPSHIFT,
        ShiftHint::Downshift => HINT_DOWNSHIFT,
    }
}

#[inline]
fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

// ============================================================================
// MAIN SERIALIZATION FUNCTION
// ============================================================================

/// Convert a snapshot to a flat buffer for FFI transfer.
///
/// See module-level documentation for the complete buffer layout.
///
/// # Example
///
/// ```rust
/// use drivetrain_sim::api::Drivetrain;
/// use drivetrain_sim::display_bridge::{snapshot_to_flatbuffer, BUFFER_SIZE, FIELD_RPM, HEADER_SIZE};
///
/// let mut sim = Drivetrain::new();
/// sim.start_engine();
/// let buffer = snapshot_to_flatbuffer(&sim.snapshot());
///
/// assert_eq!(buffer.len(), BUFFER_SIZE);
/// assert_eq!(buffer[HEADER_SIZE + FIELD_RPM], 800.0);
/// ```
pub fn snapshot_to_flatbuffer(snapshot: &DrivetrainSnapshot) -> Vec<f32> {
    let mut buffer = Vec::with_capacity(BUFFER_SIZE);

    // Header: format version
    buffer.push(FORMAT_VERSION as f32);

    buffer.push(snapshot.rpm);
    buffer.push(snapshot.speed);
    buffer.push(snapshot.wheel_rpm);
    buffer.push(snapshot.gear.as_i32() as f32);
    buffer.push(snapshot.clutch);
    buffer.push(snapshot.throttle);
    buffer.push(flag(snapshot.stalled));
    buffer.push(flag(snapshot.engine_running));
    buffer.push(status_to_id(snapshot.status));
    buffer.push(direction_to_id(snapshot.direction));
    buffer.push(hint_to_id(snapshot.shift_hint));
    buffer.push(snapshot.time);

    debug_assert_eq!(buffer.len(), BUFFER_SIZE, "Buffer size mismatch");
    buffer
}

/// Total buffer length: header plus one stride of drivetrain data.
pub const BUFFER_SIZE: usize = HEADER_SIZE + DISPLAY_STRIDE;

/// Parse the format version from a flat buffer.
///
/// Returns `None` if the buffer is empty.
#[inline]
pub fn parse_format_version(buffer: &[f32]) -> Option<u32> {
    buffer.first().map(|v| *v as u32)
}

/// Read one field from a buffer, `None` if the buffer is too short.
#[inline]
pub fn read_field(buffer: &[f32], field: usize) -> Option<f32> {
    buffer.get(HEADER_SIZE + field).copied()
}

// ============================================================================
// FIELD OFFSET CONSTANTS (for consumer-side parsing)
// ============================================================================

/// Offset within drivetrain data for: Engine rpm
pub const FIELD_RPM: usize = 0;
/// Offset within drivetrain data for: Speed
pub const FIELD_SPEED: usize = 1;
/// Offset within drivetrain data for: Wheel rpm
pub const FIELD_WHEEL_RPM: usize = 2;
/// Offset within drivetrain data for: Gear
pub const FIELD_GEAR: usize = 3;
/// Offset within drivetrain data for: Clutch pedal
pub const FIELD_CLUTCH: usize = 4;
/// Offset within drivetrain data for: Throttle pedal
pub const FIELD_THROTTLE: usize = 5;
/// Offset within drivetrain data for: Stalled flag
pub const FIELD_STALLED: usize = 6;
/// Offset within drivetrain data for: Engine running flag
pub const FIELD_ENGINE_RUNNING: usize = 7;
/// Offset within drivetrain data for: Engine status
pub const FIELD_STATUS: usize = 8;
/// Offset within drivetrain data for: Travel direction
pub const FIELD_DIRECTION: usize = 9;
/// Offset within drivetrain data for: Shift hint
pub const FIELD_SHIFT_HINT: usize = 10;
/// Offset within drivetrain data for: Simulation time
pub const FIELD_TIME: usize = 11;

// ============================================================================
// TESTS
// ============================================================================
