//! Chart projection: snapshot in, one plottable series per lead out.
//!
//! Stateless. The x-axis is the ordinal position of a point in its ring (the
//! stored `index` is a key, not a coordinate); the y-axis is fixed.

use crate::buffer::{CAPACITY, DisplaySnapshot};
use crate::lead::Lead;

/// Fixed y-axis range for every lead, in mV.
pub const Y_BOUNDS: [f64; 2] = [-1.5, 1.5];

/// Everything needed to draw one lead's chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub lead: Lead,
    pub color: (u8, u8, u8),
    /// `(x, y)` pairs oldest-first.
    pub points: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl ChartSeries {
    pub fn latest(&self) -> Option<f64> {
        self.points.last().map(|&(_, y)| y)
    }
}

/// Project `snapshot` into one series per lead, in standard lead order.
pub fn project(snapshot: &DisplaySnapshot) -> Vec<ChartSeries> {
    project_with_window(snapshot, CAPACITY)
}

/// Like [`project`] with an explicit x-axis window width.
pub fn project_with_window(snapshot: &DisplaySnapshot, window: usize) -> Vec<ChartSeries> {
    let x_max = window.max(1) as f64 - 1.0;
    Lead::ALL
        .iter()
        .map(|&lead| ChartSeries {
            lead,
            color: lead.color(),
            points: snapshot
                .points(lead)
                .iter()
                .enumerate()
                .map(|(x, p)| (x as f64, p.value))
                .collect(),
            x_bounds: [0.0, x_max],
            y_bounds: Y_BOUNDS,
        })
        .collect()
}
