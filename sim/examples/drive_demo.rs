//! Scripted drive through the gears.
//!
//! Run with: cargo run --example drive_demo

use drivetrain_sim::logging::init_logging;
use drivetrain_sim::{spawn_tick_loop, Drivetrain, TickOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

const DT: f32 = 0.016;

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging(Level::INFO) {
        eprintln!("Failed to init logging. {}", e);
    }

    println!("=== Manual Gearbox - Drive Demo ===\n");

    let mut sim = Drivetrain::new();
    sim.start_engine();
    print_state("Idle", &sim);

    // Pull away in first, then work up to fourth
    for gear in 1..=4 {
        shift(&mut sim, gear);
        release_clutch(&mut sim, 0.6);
        run(&mut sim, 150);
        print_state(&format!("Gear {}", gear), &sim);
    }

    println!("\n--- Coasting in neutral ---\n");
    sim.set_throttle(0.0);
    shift(&mut sim, 0);
    run(&mut sim, 300);
    print_state("Coast", &sim);

    println!("\n--- Lugging fifth from low speed ---\n");
    shift(&mut sim, 5);
    sim.set_clutch(0.0);
    for _ in 0..600 {
        if sim.tick(DT) == TickOutcome::Stalled {
            break;
        }
    }
    print_state("Fifth", &sim);

    println!("\n--- Live tick loop (60 Hz for one second) ---\n");
    let shared = drivetrain_sim::shared::share(sim);
    {
        let mut sim = shared.lock().await;
        sim.set_clutch(1.0);
    }
    let ticks = spawn_tick_loop(Arc::clone(&shared), Duration::from_millis(16));
    tokio::time::sleep(Duration::from_millis(250)).await;
    {
        let mut sim = shared.lock().await;
        sim.set_throttle(0.7);
    }
    tokio::time::sleep(Duration::from_millis(750)).await;
    if let Err(e) = ticks.shutdown().await {
        eprintln!("Tick loop failed. {}", e);
    }

    let sim = shared.lock().await;
    print_state("Live", &sim);

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize snapshot. {}", e),
    }
}

fn shift(sim: &mut Drivetrain, gear: i32) {
    sim.set_throttle(0.0);
    sim.set_clutch(1.0);
    // One tick with the clutch down restarts a stalled engine
    sim.tick(DT);
    if !sim.set_gear(gear) {
        println!("  shift to {} refused", gear);
    }
}

fn release_clutch(sim: &mut Drivetrain, throttle: f32) {
    sim.set_throttle(throttle);
    for i in 0..60 {
        sim.set_clutch(1.0 - (i + 1) as f32 / 60.0);
        sim.tick(DT);
    }
}

fn run(sim: &mut Drivetrain, ticks: usize) {
    for _ in 0..ticks {
        sim.tick(DT);
    }
}

fn print_state(label: &str, sim: &Drivetrain) {
    let s = sim.snapshot();
    println!(
        "  {:<6} t={:>5.2}s gear={:<2} rpm={:>6.0} wheel={:>6.0} speed={:>6.1} {:?} {:?} hint={:?}",
        label, s.time, s.gear, s.rpm, s.wheel_rpm, s.speed, s.status, s.direction, s.shift_hint
    );
}
