//! The twelve standard ECG leads.
//!
//! The lead set is fixed: every buffer, generator and chart iterates over
//! [`Lead::ALL`] in standard clinical order.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the 12 standard ECG measurement channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lead {
    I,
    II,
    III,
    #[serde(rename = "aVR")]
    AVR,
    #[serde(rename = "aVL")]
    AVL,
    #[serde(rename = "aVF")]
    AVF,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
}

/// Number of leads in a standard ECG.
pub const LEAD_COUNT: usize = 12;

impl Lead {
    /// All leads in standard order.
    pub const ALL: [Lead; LEAD_COUNT] = [
        Lead::I,
        Lead::II,
        Lead::III,
        Lead::AVR,
        Lead::AVL,
        Lead::AVF,
        Lead::V1,
        Lead::V2,
        Lead::V3,
        Lead::V4,
        Lead::V5,
        Lead::V6,
    ];

    /// Canonical wire name (`"I"`, `"aVR"`, `"V1"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::AVR => "aVR",
            Self::AVL => "aVL",
            Self::AVF => "aVF",
            Self::V1 => "V1",
            Self::V2 => "V2",
            Self::V3 => "V3",
            Self::V4 => "V4",
            Self::V5 => "V5",
            Self::V6 => "V6",
        }
    }

    /// Position of this lead in [`Lead::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display colour as an RGB triple.
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Self::I => (0xe7, 0x4c, 0x3c),
            Self::II => (0x34, 0x98, 0xdb),
            Self::III => (0x2e, 0xcc, 0x71),
            Self::AVR => (0xf3, 0x9c, 0x12),
            Self::AVL => (0x9b, 0x59, 0xb6),
            Self::AVF => (0x1a, 0xbc, 0x9c),
            Self::V1 => (0xe6, 0x7e, 0x22),
            Self::V2 => (0x34, 0x49, 0x5e),
            Self::V3 => (0x95, 0xa5, 0xa6),
            Self::V4 => (0xc0, 0x39, 0x2b),
            Self::V5 => (0x8e, 0x44, 0xad),
            Self::V6 => (0x16, 0xa0, 0x85),
        }
    }
}

impl std::fmt::Display for Lead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name one of the 12 leads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lead '{0}'")]
pub struct UnknownLead(pub String);

impl FromStr for Lead {
    type Err = UnknownLead;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lead::ALL
            .iter()
            .copied()
            .find(|lead| lead.name() == s)
            .ok_or_else(|| UnknownLead(s.to_string()))
    }
}
