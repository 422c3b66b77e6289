//! Integration tests for ecgwave-core.
//!
//! These tests exercise the full display pipeline:
//! generator → live buffer → snapshot → chart projection.

use ecgwave_core::{
    CAPACITY, EcgRecord, GeneratorKind, HeartRateDriver, JsonlStore, LEAD_COUNT, Lead, LiveBuffer,
    NoiseGenerator, RecordStore, Sample, SignalGenerator, WaveformGenerator, lead_value, phase_at,
    project,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn waveform_pipeline_fills_every_chart() {
    let mut generator = WaveformGenerator::new(StdRng::seed_from_u64(1));
    let mut buffer = LiveBuffer::default();

    for tick in 0..(CAPACITY as u64 * 3) {
        buffer.append(&generator.generate(1_700_000_000_000 + tick * 40));
        for lead in Lead::ALL {
            assert!(buffer.ring(lead).len() <= CAPACITY);
        }
    }

    let charts = project(&buffer.snapshot());
    assert_eq!(charts.len(), LEAD_COUNT);
    for chart in &charts {
        assert_eq!(chart.points.len(), CAPACITY);
        assert!(
            chart
                .points
                .iter()
                .all(|&(_, y)| (chart.y_bounds[0]..=chart.y_bounds[1]).contains(&y)),
            "{} left the fixed y range",
            chart.lead
        );
    }
}

#[test]
fn noise_pipeline_survivors_are_most_recent() {
    let mut generator = NoiseGenerator::new(StdRng::seed_from_u64(2));
    let mut buffer = LiveBuffer::default();
    let mut sent: Vec<Sample> = Vec::new();

    for tick in 0..150u64 {
        let s = generator.generate(tick * 250);
        buffer.append(&s);
        sent.push(s);
    }

    let snapshot = buffer.snapshot();
    let expected = &sent[sent.len() - CAPACITY..];
    for lead in Lead::ALL {
        let points = snapshot.points(lead);
        assert_eq!(points.len(), CAPACITY);
        for (p, s) in points.iter().zip(expected) {
            assert_eq!(p.timestamp, s.timestamp);
            assert_eq!(Some(p.value), s.value(lead));
        }
    }
    // the 51st sample is the oldest survivor
    assert_eq!(snapshot.points(Lead::I)[0].timestamp, sent[50].timestamp);
}

#[test]
fn heart_rate_drift_feeds_waveform_phase() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut driver = HeartRateDriver::default();
    let mut generator = WaveformGenerator::new(StdRng::seed_from_u64(4)).with_noise(0.0);

    for _ in 0..50 {
        let bpm = driver.drift(&mut rng);
        assert!((50..=120).contains(&bpm));
        generator.set_heart_rate(bpm);

        let ts = 12_345;
        let s = generator.generate(ts);
        let phase = phase_at(bpm as f64, ts);
        let expected = (lead_value(Lead::V4, phase) * 1000.0).round() / 1000.0;
        assert_eq!(s.value(Lead::V4), Some(expected));
    }
}

#[test]
fn wire_sample_roundtrips_through_buffer() {
    let json = r#"{"timestamp": 1000, "leads": {"I": 0.1, "II": 0.2, "aVF": -0.3, "bogus": 5}}"#;
    let sample: Sample = serde_json::from_str(json).unwrap();
    let mut buffer = LiveBuffer::default();
    buffer.append(&sample);

    let snap = buffer.snapshot();
    assert_eq!(snap.latest(Lead::AVF), Some(-0.3));
    assert_eq!(snap.series.len(), LEAD_COUNT);
}

#[test]
fn built_generators_respect_their_kind() {
    for kind in [GeneratorKind::Waveform, GeneratorKind::Noise] {
        let mut g = GeneratorKind::build(kind);
        let s = g.generate(0);
        assert_eq!(s.leads.len(), LEAD_COUNT);
        assert_eq!(g.name(), kind.to_string());
    }
}

#[test]
fn file_store_keeps_saved_records() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("ecg.jsonl");
    let store = JsonlStore::open(&path).unwrap();

    let record = EcgRecord::new(serde_json::json!({"leads": {"I": [0.1, 0.2]}}), "patient-42");
    let key = record.id_ecg;
    store.insert(record.clone()).unwrap();
    drop(store);

    let reopened = JsonlStore::open(&path).unwrap();
    assert_eq!(reopened.get(key).unwrap(), Some(record));
    assert_eq!(reopened.list_for_patient("patient-42").unwrap().len(), 1);
}
