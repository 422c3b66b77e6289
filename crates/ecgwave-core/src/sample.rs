//! Wire-level data: one multi-lead [`Sample`] per tick, plus the single-value
//! [`Pulse`] used by the per-connection demo channel.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};

use crate::lead::Lead;

/// One multi-lead measurement.
///
/// Serializes as `{"timestamp": <ms>, "leads": {"I": <f64>, ...}}`. Lead names
/// outside the standard twelve are dropped on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(deserialize_with = "known_leads")]
    pub leads: BTreeMap<Lead, f64>,
}

impl Sample {
    pub fn new(timestamp: u64, leads: BTreeMap<Lead, f64>) -> Self {
        Self { timestamp, leads }
    }

    /// Value for `lead`, if the sample carries one.
    pub fn value(&self, lead: Lead) -> Option<f64> {
        self.leads.get(&lead).copied()
    }
}

fn known_leads<'de, D>(deserializer: D) -> Result<BTreeMap<Lead, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, f64> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| match name.parse::<Lead>() {
            Ok(lead) => Some((lead, value)),
            Err(_) => {
                log::debug!("ignoring unknown lead '{name}'");
                None
            }
        })
        .collect())
}

/// Single heart-rate-like reading: `{"value": <f64>, "time": <ms>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub value: f64,
    pub time: u64,
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_serializes_with_lead_names() {
        let mut leads = BTreeMap::new();
        leads.insert(Lead::I, 0.12);
        leads.insert(Lead::AVR, -0.05);
        let s = Sample::new(1_700_000_000_000, leads);

        let json: serde_json::Value = serde_json::to_value(&s).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_000u64);
        assert_eq!(json["leads"]["I"], 0.12);
        assert_eq!(json["leads"]["aVR"], -0.05);
    }

    #[test]
    fn unknown_leads_are_dropped() {
        let s: Sample =
            serde_json::from_str(r#"{"timestamp": 5, "leads": {"II": 0.3, "V9": 1.0, "X": 2.0}}"#)
                .unwrap();
        assert_eq!(s.leads.len(), 1);
        assert_eq!(s.value(Lead::II), Some(0.3));
        assert_eq!(s.value(Lead::V1), None);
    }

    #[test]
    fn pulse_wire_shape() {
        let p = Pulse {
            value: 42.0,
            time: 1000,
        };
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"{"value":42.0,"time":1000}"#
        );
    }

    #[test]
    fn round_to_decimals() {
        assert_eq!(round_to(0.123456, 2), 0.12);
        assert_eq!(round_to(-0.0696, 3), -0.07);
        assert_eq!(round_to(0.145, 0), 0.0);
    }

    #[test]
    fn now_ms_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
