//! Server-side signal simulation.
//!
//! One task owns the generator and the heart-rate driver. Every generator tick
//! produces a [`Sample`](ecgwave_core::Sample) that goes out through the
//! injected [`Broadcaster`]; every drift period the heart rate takes one
//! bounded random step.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use ecgwave_core::heart_rate::DRIFT_PERIOD;
use ecgwave_core::{HeartRateDriver, SignalGenerator, now_ms};

use crate::broadcast::Broadcaster;

/// Start the simulation loop on the current runtime.
pub fn spawn_simulation(
    generator: Box<dyn SignalGenerator>,
    broadcaster: Broadcaster,
) -> JoinHandle<()> {
    tokio::spawn(run_simulation(generator, broadcaster))
}

/// Tick `generator` forever, emitting each sample. Cancel by aborting the task.
pub async fn run_simulation(mut generator: Box<dyn SignalGenerator>, broadcaster: Broadcaster) {
    let period = generator.tick_period();
    log::info!(
        "simulation started: {} generator every {}ms",
        generator.name(),
        period.as_millis()
    );

    let mut heart_rate = HeartRateDriver::default();
    let mut rng = StdRng::from_os_rng();
    generator.set_heart_rate(heart_rate.bpm());

    let mut tick = time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut drift = time::interval_at(Instant::now() + DRIFT_PERIOD, DRIFT_PERIOD);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let sample = generator.generate(now_ms());
                let receivers = broadcaster.emit(&sample);
                log::debug!("tick {} -> {receivers} client(s)", sample.timestamp);
            }
            _ = drift.tick() => {
                let bpm = heart_rate.drift(&mut rng);
                generator.set_heart_rate(bpm);
                log::debug!("heart rate now {bpm} bpm");
            }
        }
    }
}
