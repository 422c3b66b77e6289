//! Per-lead fixed-capacity rings and the live display buffer.
//!
//! Each lead owns a [`ChannelRing`]: a circular buffer that evicts exactly one
//! oldest point per push once full. [`LiveBuffer`] fans a [`Sample`] out to all
//! twelve rings and hands the renderer owned [`DisplaySnapshot`]s, so readers
//! never observe a half-applied update.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::lead::{LEAD_COUNT, Lead};
use crate::sample::Sample;

/// Default number of points retained per lead.
pub const CAPACITY: usize = 100;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub timestamp: u64,
    pub value: f64,
    /// Ring length before this point was inserted, modulo capacity.
    pub index: usize,
}

// ---------------------------------------------------------------------------
// ChannelRing
// ---------------------------------------------------------------------------

/// Circular FIFO of at most `capacity` points.
#[derive(Debug, Clone)]
pub struct ChannelRing {
    slots: Vec<Point>,
    /// Slot holding the oldest point once the ring has wrapped.
    head: usize,
    capacity: usize,
}

impl Default for ChannelRing {
    fn default() -> Self {
        Self::with_capacity(CAPACITY)
    }
}

impl ChannelRing {
    /// Empty ring holding at most `capacity` points (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Append a reading, evicting the oldest point if the ring is full.
    /// Returns the evicted point.
    pub fn push(&mut self, timestamp: u64, value: f64) -> Option<Point> {
        let point = Point {
            timestamp,
            value,
            index: self.slots.len() % self.capacity,
        };
        if self.is_full() {
            let evicted = std::mem::replace(&mut self.slots[self.head], point);
            self.head = (self.head + 1) % self.capacity;
            Some(evicted)
        } else {
            self.slots.push(point);
            None
        }
    }

    /// Oldest point, if any.
    pub fn oldest(&self) -> Option<&Point> {
        self.slots.get(self.head)
    }

    /// Most recently pushed point, if any.
    pub fn latest(&self) -> Option<&Point> {
        if self.slots.is_empty() {
            return None;
        }
        let last = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots.get(last)
    }

    /// Points oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        let (tail, front) = self.slots.split_at(self.head);
        front.iter().chain(tail.iter())
    }

    /// Owned copy of the points, oldest-first.
    pub fn to_vec(&self) -> Vec<Point> {
        self.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}

// ---------------------------------------------------------------------------
// DisplaySnapshot
// ---------------------------------------------------------------------------

/// Full, owned copy of every lead's ring at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub series: BTreeMap<Lead, Vec<Point>>,
}

impl DisplaySnapshot {
    /// Points for `lead`, oldest-first (empty if the lead has no data).
    pub fn points(&self, lead: Lead) -> &[Point] {
        self.series.get(&lead).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Latest value of `lead`, if any.
    pub fn latest(&self, lead: Lead) -> Option<f64> {
        self.points(lead).last().map(|p| p.value)
    }
}

// ---------------------------------------------------------------------------
// LiveBuffer
// ---------------------------------------------------------------------------

/// Twelve rings, one per lead. The lead set is fixed at construction.
#[derive(Debug, Clone)]
pub struct LiveBuffer {
    rings: [ChannelRing; LEAD_COUNT],
    samples_seen: u64,
}

impl Default for LiveBuffer {
    fn default() -> Self {
        Self::with_capacity(CAPACITY)
    }
}

impl LiveBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rings: std::array::from_fn(|_| ChannelRing::with_capacity(capacity)),
            samples_seen: 0,
        }
    }

    /// Fan `sample` out to every lead it carries a value for.
    pub fn append(&mut self, sample: &Sample) {
        for (&lead, &value) in &sample.leads {
            self.rings[lead.index()].push(sample.timestamp, value);
        }
        self.samples_seen += 1;
    }

    /// Ring for `lead`.
    pub fn ring(&self, lead: Lead) -> &ChannelRing {
        &self.rings[lead.index()]
    }

    /// Total samples appended since construction or the last [`clear`](Self::clear).
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// Full replacement snapshot of every ring.
    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            series: Lead::ALL
                .iter()
                .map(|&lead| (lead, self.rings[lead.index()].to_vec()))
                .collect(),
        }
    }

    pub fn clear(&mut self) {
        for ring in &mut self.rings {
            ring.clear();
        }
        self.samples_seen = 0;
    }
}
