//! Basic simulation example.
//!
//! Runs the waveform generator for ten simulated seconds, fills the live
//! buffer, and prints the latest value of every lead.
//!
//! Run: `cargo run --example basic`

use ecgwave_core::{HeartRateDriver, Lead, LiveBuffer, SignalGenerator, WaveformGenerator, now_ms};

fn main() {
    let mut generator = WaveformGenerator::from_os_rng();
    let mut heart_rate = HeartRateDriver::default();
    let mut buffer = LiveBuffer::default();
    let mut rng = rand::rng();

    let start = now_ms();
    let tick_ms = generator.tick_period().as_millis() as u64;

    // 10 seconds at 25 Hz, heart rate drifting every 5 seconds
    for tick in 0..250u64 {
        let ts = start + tick * tick_ms;
        if tick > 0 && (tick * tick_ms) % 5000 == 0 {
            generator.set_heart_rate(heart_rate.drift(&mut rng));
        }
        buffer.append(&generator.generate(ts));
    }

    println!("Heart rate: {} bpm", heart_rate.bpm());
    println!("Samples appended: {}", buffer.samples_seen());

    let snapshot = buffer.snapshot();
    for lead in Lead::ALL {
        let points = snapshot.points(lead);
        println!(
            "{:>4}: {:>3} points, latest {:+.3} mV",
            lead.name(),
            points.len(),
            snapshot.latest(lead).unwrap_or(0.0)
        );
    }
}
