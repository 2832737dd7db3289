//! Shared simulator handle and a fixed-period tick loop.
//!
//! Inputs arriving from UI handlers and the periodic tick both go through the
//! same mutex, so a setter always completes before the next tick sees it.

use crate::api::Drivetrain;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// A simulator shared between the tick loop and input handlers.
pub type SharedDrivetrain = Arc<Mutex<Drivetrain>>;

pub fn share(sim: Drivetrain) -> SharedDrivetrain {
    Arc::new(Mutex::new(sim))
}

/// Handle to a running tick loop.
pub struct TickLoop {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TickLoop {
    /// Stop the loop and wait for it to finish its current tick.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        // The receiver only disappears once the loop has already exited
        let _ = self.stop.send(true);
        self.handle.await
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn a task ticking `sim` every `period` with measured wall-clock time.
///
/// Missed intervals are delayed rather than replayed in a burst; the elapsed
/// clamp in [`Drivetrain::tick`] bounds any long gap.
pub fn spawn_tick_loop(sim: SharedDrivetrain, period: Duration) -> TickLoop {
    let (stop, mut stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_ms = period.as_millis() as u64, "tick loop started");

        loop {
            tokio::select! {
                instant = ticker.tick() => {
                    let mut sim = sim.lock().await;
                    sim.tick_at(instant.into_std());
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("tick loop stopped");
    });

    TickLoop { stop, handle }
}
