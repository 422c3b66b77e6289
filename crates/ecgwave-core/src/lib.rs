//! # ecgwave-core
//!
//! **A synthetic 12-lead ECG you can stream, buffer and plot.**
//!
//! `ecgwave-core` produces simulated electrocardiogram samples, keeps a rolling
//! window per lead, and projects that window into chart series.
//!
//! ## Quick Start
//!
//! ```
//! use ecgwave_core::{LiveBuffer, SignalGenerator, WaveformGenerator, project};
//!
//! let mut generator = WaveformGenerator::from_os_rng();
//! let mut buffer = LiveBuffer::default();
//!
//! for tick in 0..250u64 {
//!     let sample = generator.generate(tick * 40);
//!     buffer.append(&sample);
//! }
//!
//! let charts = project(&buffer.snapshot());
//! assert_eq!(charts.len(), 12);
//! assert!(charts.iter().all(|c| c.points.len() == 100));
//! ```
//!
//! ## Architecture
//!
//! Generator → Sample → LiveBuffer (one ring per lead) → Snapshot → Chart series
//!
//! Two generators implement [`SignalGenerator`]:
//! - **Waveform**: P/QRS/T terms from a per-lead parameter table, phase driven
//!   by a drifting heart rate ([`HeartRateDriver`]). 25 Hz.
//! - **Noise**: uniform noise in ±0.15 per lead. 4 Hz.
//!
//! Saved recordings go through the [`RecordStore`] trait.

pub mod buffer;
pub mod generator;
pub mod heart_rate;
pub mod lead;
pub mod render;
pub mod sample;
pub mod store;

pub use buffer::{CAPACITY, ChannelRing, DisplaySnapshot, LiveBuffer, Point};
pub use generator::{
    GeneratorKind, NoiseGenerator, PulseGenerator, SignalGenerator, WaveComponent,
    WaveformGenerator, lead_value, phase_at,
};
pub use heart_rate::HeartRateDriver;
pub use lead::{LEAD_COUNT, Lead};
pub use render::{ChartSeries, Y_BOUNDS, project};
pub use sample::{Pulse, Sample, now_ms};
pub use store::{EcgRecord, JsonlStore, MemoryStore, RecordStore, StoreError};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
