//! ECS systems for the drivetrain simulation.
//!
//! Systems contain the tick logic that operates on the state resources.
//!
//! ## Tick Order
//!
//! Systems run strictly in sequence, each reading what the previous one wrote:
//!
//! **Gate** - decide whether this tick updates anything:
//! - `stall_check_system` - Stalls an engine lugging below its floor
//! - `restart_system` - Restarts a stalled engine once the clutch is pressed
//!
//! **Physics** - only when the gate leaves `TickOutcome::Running`:
//! - `rpm_update_system` - Moves rpm toward its free-running or wheel target
//! - `speed_update_system` - Applies resistance, drive, engine braking, slip drag

pub mod clock;
pub mod engine;
pub mod stall;
pub mod vehicle;

pub use clock::*;
pub use engine::*;
pub use stall::*;
pub use vehicle::*;
