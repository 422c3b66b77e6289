//! Heart-rate drift for the waveform generator.
//!
//! Every [`DRIFT_PERIOD`] the rate moves by a uniform integer step in
//! `[-MAX_STEP, MAX_STEP]` and is clamped to `[MIN_HEART_RATE, MAX_HEART_RATE]`.

use std::time::Duration;

use rand::Rng;

/// Starting heart rate in bpm.
pub const DEFAULT_HEART_RATE: u32 = 75;

/// Lower bound in bpm.
pub const MIN_HEART_RATE: u32 = 50;

/// Upper bound in bpm.
pub const MAX_HEART_RATE: u32 = 120;

/// Largest single drift step in bpm.
pub const MAX_STEP: i32 = 5;

/// Interval between drift steps.
pub const DRIFT_PERIOD: Duration = Duration::from_secs(5);

/// Bounded random walk over heart rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartRateDriver {
    bpm: u32,
}

impl Default for HeartRateDriver {
    fn default() -> Self {
        Self::new(DEFAULT_HEART_RATE)
    }
}

impl HeartRateDriver {
    /// Start at `bpm`, clamped into range.
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm: bpm.clamp(MIN_HEART_RATE, MAX_HEART_RATE),
        }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Apply a step of `delta` bpm and return the new rate.
    pub fn apply_step(&mut self, delta: i32) -> u32 {
        let next = (self.bpm as i64 + delta as i64)
            .clamp(MIN_HEART_RATE as i64, MAX_HEART_RATE as i64);
        self.bpm = next as u32;
        self.bpm
    }

    /// Draw a step from `rng` and apply it.
    pub fn drift<R: Rng>(&mut self, rng: &mut R) -> u32 {
        let delta = rng.random_range(-MAX_STEP..=MAX_STEP);
        self.apply_step(delta)
    }
}
