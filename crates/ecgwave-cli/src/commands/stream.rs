use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use ecgwave_core::heart_rate::DRIFT_PERIOD;
use ecgwave_core::{GeneratorKind, HeartRateDriver, SignalGenerator, now_ms};

pub fn run(kind: GeneratorKind, count: u64, seed: Option<u64>) -> io::Result<()> {
    let mut generator = match seed {
        Some(seed) => kind.build_seeded(seed),
        None => kind.build(),
    };
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_os_rng(),
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)).map_err(io::Error::other)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = write_samples(
        &mut out,
        generator.as_mut(),
        &mut rng,
        count,
        &running,
        true,
    )?;
    log::debug!("streamed {written} sample(s)");
    Ok(())
}

/// Write up to `count` samples (0 = unbounded) as JSON lines. When `paced`,
/// sleeps one tick period between samples and drifts the heart rate.
/// A closed pipe ends the stream without error.
fn write_samples<W: Write>(
    out: &mut W,
    generator: &mut dyn SignalGenerator,
    rng: &mut StdRng,
    count: u64,
    running: &AtomicBool,
    paced: bool,
) -> io::Result<u64> {
    let mut heart_rate = HeartRateDriver::default();
    let mut last_drift = Instant::now();
    let mut written = 0u64;

    while running.load(Ordering::SeqCst) && (count == 0 || written < count) {
        if paced && last_drift.elapsed() >= DRIFT_PERIOD {
            generator.set_heart_rate(heart_rate.drift(rng));
            last_drift = Instant::now();
        }

        let sample = generator.generate(now_ms());
        let line = serde_json::to_string(&sample).map_err(io::Error::other)?;
        match writeln!(out, "{line}").and_then(|_| out.flush()) {
            Ok(()) => written += 1,
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => break,
            Err(e) => return Err(e),
        }

        if paced {
            std::thread::sleep(generator.tick_period());
        }
    }
    Ok(written)
}
