//! Synthetic signal generators.
//!
//! Every generator implements [`SignalGenerator`]: given a wall-clock
//! timestamp it produces one [`Sample`] covering all 12 leads. Generation has
//! no I/O and cannot fail.
//!
//! Two generators exist:
//! - [`WaveformGenerator`]: closed-form P/QRS/T synthesis driven by a heart
//!   rate, 25 Hz.
//! - [`NoiseGenerator`]: independent uniform noise per lead, 4 Hz.
//!
//! [`PulseGenerator`] feeds the single-value demo channel and is not a
//! [`SignalGenerator`].

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::str::FromStr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::heart_rate::DEFAULT_HEART_RATE;
use crate::lead::{LEAD_COUNT, Lead};
use crate::sample::{Pulse, Sample, round_to};

/// Tick period of the waveform generator (25 Hz).
pub const WAVEFORM_TICK: Duration = Duration::from_millis(40);

/// Tick period of the noise generator (4 Hz).
pub const NOISE_TICK: Duration = Duration::from_millis(250);

/// Emission period of the pulse channel.
pub const PULSE_TICK: Duration = Duration::from_secs(1);

/// Default half-width of the uniform noise added to waveform output.
pub const DEFAULT_WAVEFORM_NOISE: f64 = 0.025;

/// Half-width of the noise generator's uniform range.
pub const NOISE_RANGE: f64 = 0.15;

/// Trait every synthetic signal source implements.
pub trait SignalGenerator: Send {
    /// Short identifier (`"waveform"`, `"noise"`).
    fn name(&self) -> &'static str;

    /// Interval between consecutive samples.
    fn tick_period(&self) -> Duration;

    /// Produce one sample for `timestamp_ms`.
    fn generate(&mut self, timestamp_ms: u64) -> Sample;

    /// Update the heart rate driving the signal. Generators that do not model
    /// a heart rate ignore it.
    fn set_heart_rate(&mut self, _bpm: u32) {}
}

// ---------------------------------------------------------------------------
// Waveform table
// ---------------------------------------------------------------------------

/// One Gaussian-enveloped sine term:
/// `amplitude · sin(phase + phase_offset) · exp(-(width · (f − center))²)`
/// where `f` is the position within the cardiac cycle in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveComponent {
    pub amplitude: f64,
    pub phase_offset: f64,
    pub center: f64,
    pub width: f64,
}

const fn p_wave(amplitude: f64) -> WaveComponent {
    WaveComponent {
        amplitude,
        phase_offset: -FRAC_PI_2,
        center: 0.15,
        width: 4.0,
    }
}

const fn qrs(amplitude: f64) -> WaveComponent {
    WaveComponent {
        amplitude,
        phase_offset: 0.0,
        center: 0.35,
        width: 10.0,
    }
}

/// Right-precordial QRS: inverted and narrower.
const fn qrs_septal(amplitude: f64) -> WaveComponent {
    WaveComponent {
        amplitude,
        phase_offset: PI,
        center: 0.35,
        width: 12.0,
    }
}

const fn t_wave(amplitude: f64) -> WaveComponent {
    WaveComponent {
        amplitude,
        phase_offset: FRAC_PI_2,
        center: 0.6,
        width: 6.0,
    }
}

/// P, QRS and T terms per lead, indexed by [`Lead::index`].
pub const WAVE_TABLE: [[WaveComponent; 3]; LEAD_COUNT] = [
    [p_wave(0.1), qrs(0.5), t_wave(0.2)],          // I
    [p_wave(0.15), qrs(0.8), t_wave(0.3)],         // II
    [p_wave(0.1), qrs(0.6), t_wave(0.25)],         // III
    [p_wave(-0.08), qrs(-0.4), t_wave(-0.15)],     // aVR
    [p_wave(0.05), qrs(0.3), t_wave(0.1)],         // aVL
    [p_wave(0.12), qrs(0.7), t_wave(0.25)],        // aVF
    [p_wave(0.05), qrs_septal(0.2), t_wave(0.3)],  // V1
    [p_wave(0.06), qrs_septal(0.4), t_wave(0.4)],  // V2
    [p_wave(0.07), qrs(0.6), t_wave(0.35)],        // V3
    [p_wave(0.08), qrs(0.7), t_wave(0.3)],         // V4
    [p_wave(0.09), qrs(0.75), t_wave(0.25)],       // V5
    [p_wave(0.1), qrs(0.8), t_wave(0.2)],          // V6
];

/// Shared cardiac phase in radians for a heart rate and wall-clock time.
pub fn phase_at(heart_rate_bpm: f64, timestamp_ms: u64) -> f64 {
    let seconds = timestamp_ms as f64 / 1000.0;
    TAU * (heart_rate_bpm / 60.0) * seconds
}

/// Noise-free value of `lead` at `phase`.
pub fn lead_value(lead: Lead, phase: f64) -> f64 {
    let cycle = (phase / TAU).rem_euclid(1.0);
    WAVE_TABLE[lead.index()]
        .iter()
        .map(|c| {
            let envelope = (-(c.width * (cycle - c.center)).powi(2)).exp();
            c.amplitude * (phase + c.phase_offset).sin() * envelope
        })
        .sum()
}

// ---------------------------------------------------------------------------
// WaveformGenerator
// ---------------------------------------------------------------------------

/// Closed-form P/QRS/T synthesis for all 12 leads.
pub struct WaveformGenerator<R = StdRng> {
    heart_rate: u32,
    noise: f64,
    rng: R,
}

impl WaveformGenerator<StdRng> {
    /// Generator seeded from the OS, default heart rate and noise.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> WaveformGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            heart_rate: DEFAULT_HEART_RATE,
            noise: DEFAULT_WAVEFORM_NOISE,
            rng,
        }
    }

    /// Set the noise half-width. `0.0` makes output fully deterministic.
    pub fn with_noise(mut self, half_width: f64) -> Self {
        self.noise = half_width.abs();
        self
    }

    pub fn heart_rate(&self) -> u32 {
        self.heart_rate
    }

    pub fn noise(&self) -> f64 {
        self.noise
    }
}

impl<R: Rng + Send> SignalGenerator for WaveformGenerator<R> {
    fn name(&self) -> &'static str {
        "waveform"
    }

    fn tick_period(&self) -> Duration {
        WAVEFORM_TICK
    }

    fn generate(&mut self, timestamp_ms: u64) -> Sample {
        let phase = phase_at(self.heart_rate as f64, timestamp_ms);
        let leads: BTreeMap<Lead, f64> = Lead::ALL
            .iter()
            .map(|&lead| {
                let noise = if self.noise > 0.0 {
                    (self.rng.random::<f64>() - 0.5) * 2.0 * self.noise
                } else {
                    0.0
                };
                (lead, round_to(lead_value(lead, phase) + noise, 3))
            })
            .collect();
        Sample::new(timestamp_ms, leads)
    }

    fn set_heart_rate(&mut self, bpm: u32) {
        self.heart_rate = bpm;
    }
}

// ---------------------------------------------------------------------------
// NoiseGenerator
// ---------------------------------------------------------------------------

/// Independent uniform noise in `[-0.15, 0.15]` per lead, 2 decimals.
pub struct NoiseGenerator<R = StdRng> {
    rng: R,
}

impl NoiseGenerator<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> NoiseGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> SignalGenerator for NoiseGenerator<R> {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn tick_period(&self) -> Duration {
        NOISE_TICK
    }

    fn generate(&mut self, timestamp_ms: u64) -> Sample {
        let leads: BTreeMap<Lead, f64> = Lead::ALL
            .iter()
            .map(|&lead| {
                let v = self.rng.random::<f64>() * 2.0 * NOISE_RANGE - NOISE_RANGE;
                (lead, round_to(v, 2))
            })
            .collect();
        Sample::new(timestamp_ms, leads)
    }
}

// ---------------------------------------------------------------------------
// PulseGenerator
// ---------------------------------------------------------------------------

/// Integer readings in `[0, 100)` for the single-value demo channel.
pub struct PulseGenerator<R = StdRng> {
    rng: R,
}

impl PulseGenerator<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> PulseGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn next_pulse(&mut self, time_ms: u64) -> Pulse {
        Pulse {
            value: (self.rng.random::<f64>() * 100.0).floor(),
            time: time_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// GeneratorKind
// ---------------------------------------------------------------------------

/// Selects which [`SignalGenerator`] to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorKind {
    Waveform,
    #[default]
    Noise,
}

impl GeneratorKind {
    /// Build an OS-seeded generator of this kind.
    pub fn build(self) -> Box<dyn SignalGenerator> {
        match self {
            Self::Waveform => Box::new(WaveformGenerator::from_os_rng()),
            Self::Noise => Box::new(NoiseGenerator::from_os_rng()),
        }
    }

    /// Build a generator whose random draws are fixed by `seed`.
    pub fn build_seeded(self, seed: u64) -> Box<dyn SignalGenerator> {
        let rng = StdRng::seed_from_u64(seed);
        match self {
            Self::Waveform => Box::new(WaveformGenerator::new(rng)),
            Self::Noise => Box::new(NoiseGenerator::new(rng)),
        }
    }
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waveform => write!(f, "waveform"),
            Self::Noise => write!(f, "noise"),
        }
    }
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waveform" | "wave" => Ok(Self::Waveform),
            "noise" => Ok(Self::Noise),
            other => Err(format!("unknown generator '{other}' (expected waveform or noise)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn phase_zero_at_epoch() {
        assert_eq!(phase_at(75.0, 0), 0.0);
    }

    #[test]
    fn phase_one_cycle_per_beat() {
        // 60 bpm = 1 Hz, so one second is exactly one full cycle.
        let p = phase_at(60.0, 1000);
        assert!((p - TAU).abs() < 1e-12);
    }

    #[test]
    fn lead_i_at_phase_zero_matches_formula() {
        let p = 0.1 * (-FRAC_PI_2).sin() * (-(4.0f64 * (0.0 - 0.15)).powi(2)).exp();
        let qrs = 0.5 * 0.0f64.sin() * (-(10.0f64 * (0.0 - 0.35)).powi(2)).exp();
        let t = 0.2 * FRAC_PI_2.sin() * (-(6.0f64 * (0.0 - 0.6)).powi(2)).exp();
        let expected = p + qrs + t;
        assert!((lead_value(Lead::I, 0.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn avr_is_inverted_lead_ii_shape() {
        // aVR amplitudes are all negative, so near the T-wave peak it has the
        // opposite sign to lead II.
        let phase = TAU * 0.35 + FRAC_PI_2;
        assert!(lead_value(Lead::II, phase) * lead_value(Lead::AVR, phase) <= 0.0);
    }

    #[test]
    fn noiseless_waveform_is_deterministic() {
        let mut a = WaveformGenerator::new(seeded(1)).with_noise(0.0);
        let mut b = WaveformGenerator::new(seeded(2)).with_noise(0.0);
        for ts in [0u64, 40, 1234, 1_700_000_000_000] {
            assert_eq!(a.generate(ts), b.generate(ts));
        }
    }

    #[test]
    fn noiseless_waveform_at_epoch_rounds_formula() {
        let mut g = WaveformGenerator::new(seeded(0)).with_noise(0.0);
        let s = g.generate(0);
        assert_eq!(s.timestamp, 0);
        assert_eq!(s.leads.len(), LEAD_COUNT);
        assert_eq!(s.value(Lead::I), Some(-0.07));
        for lead in Lead::ALL {
            assert_eq!(s.value(lead), Some(round_to(lead_value(lead, 0.0), 3)));
        }
    }

    #[test]
    fn waveform_noise_is_bounded() {
        let mut g = WaveformGenerator::new(seeded(7));
        for i in 0..500u64 {
            let ts = i * 40;
            let phase = phase_at(g.heart_rate() as f64, ts);
            let s = g.generate(ts);
            for lead in Lead::ALL {
                let clean = lead_value(lead, phase);
                let diff = (s.value(lead).unwrap() - clean).abs();
                // noise half-width plus rounding slack
                assert!(diff <= DEFAULT_WAVEFORM_NOISE + 0.0005 + 1e-9, "diff {diff}");
            }
        }
    }

    #[test]
    fn waveform_heart_rate_changes_phase() {
        let mut g = WaveformGenerator::new(seeded(0)).with_noise(0.0);
        let slow = g.generate(333);
        g.set_heart_rate(120);
        let fast = g.generate(333);
        assert_eq!(g.heart_rate(), 120);
        assert_ne!(slow, fast);
    }

    #[test]
    fn noise_generator_range_and_precision() {
        let mut g = NoiseGenerator::new(seeded(42));
        for i in 0..200 {
            let s = g.generate(i);
            assert_eq!(s.leads.len(), LEAD_COUNT);
            for v in s.leads.values() {
                assert!((-NOISE_RANGE..=NOISE_RANGE).contains(v), "{v}");
                assert_eq!(round_to(*v, 2), *v);
            }
        }
    }

    #[test]
    fn noise_generator_ignores_heart_rate() {
        let mut a = NoiseGenerator::new(seeded(3));
        let mut b = NoiseGenerator::new(seeded(3));
        b.set_heart_rate(50);
        assert_eq!(a.generate(10), b.generate(10));
    }

    #[test]
    fn tick_periods() {
        assert_eq!(WaveformGenerator::new(seeded(0)).tick_period(), Duration::from_millis(40));
        assert_eq!(NoiseGenerator::new(seeded(0)).tick_period(), Duration::from_millis(250));
    }

    #[test]
    fn pulse_values_are_integers_below_100() {
        let mut g = PulseGenerator::new(seeded(9));
        for t in 0..200 {
            let p = g.next_pulse(t);
            assert_eq!(p.time, t);
            assert!((0.0..100.0).contains(&p.value));
            assert_eq!(p.value.fract(), 0.0);
        }
    }

    #[test]
    fn generator_kind_parse_and_display() {
        assert_eq!("waveform".parse::<GeneratorKind>(), Ok(GeneratorKind::Waveform));
        assert_eq!("noise".parse::<GeneratorKind>(), Ok(GeneratorKind::Noise));
        assert!("sine".parse::<GeneratorKind>().is_err());
        assert_eq!(GeneratorKind::Waveform.to_string(), "waveform");
        assert_eq!(GeneratorKind::default(), GeneratorKind::Noise);
    }

    #[test]
    fn generator_kind_builds_matching_generator() {
        assert_eq!(GeneratorKind::Waveform.build().name(), "waveform");
        assert_eq!(GeneratorKind::Noise.build().name(), "noise");
    }

    #[test]
    fn seeded_builds_repeat() {
        for kind in [GeneratorKind::Waveform, GeneratorKind::Noise] {
            let mut a = kind.build_seeded(11);
            let mut b = kind.build_seeded(11);
            for ts in [0, 40, 80] {
                assert_eq!(a.generate(ts), b.generate(ts));
            }
        }
    }
}
