//! # Beeswarm Module
//!
//! One-dimensional dodge layout. Circles of a fixed radius are centered at their
//! target positions along the primary axis and pushed along the orthogonal axis
//! just far enough that no two overlap.
//!
//! Points are placed in position order. A FIFO window holds the placed points
//! that can still collide with the next one; anything more than a diameter
//! behind the current position is evicted from the front.

use serde::Serialize;
use std::collections::VecDeque;

/// Relative overlap tolerance. Scaled by the squared diameter (at least 1) and
/// applied to squared distances; near-tangent circles count as separate.
pub const EPSILON: f64 = 1e-3;

/// A placed point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PackedPoint {
    /// Position of the point in the caller's input
    pub index: usize,
    pub position: f64,
    /// Orthogonal displacement, never negative
    pub offset: f64,
}

/// Packing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beeswarm {
    radius: f64,
}

impl Beeswarm {
    /// `radius` must be finite and positive.
    pub fn new(radius: f64) -> anyhow::Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            anyhow::bail!("Invalid beeswarm radius: {radius} (must be finite and positive)");
        }
        Ok(Self { radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Minimum center-to-center distance.
    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }

    /// Slack allowed on squared center distances.
    pub fn tolerance(&self) -> f64 {
        let diameter = self.diameter();
        EPSILON * (diameter * diameter).max(1.0)
    }

    /// Smallest center distance a packed layout may contain.
    pub fn min_distance(&self) -> f64 {
        let diameter = self.diameter();
        (diameter * diameter - self.tolerance()).sqrt()
    }

    /// Pack `positions`. The result is ordered by position (ties keep input
    /// order) and carries each point's input index.
    pub fn pack(&self, positions: &[f64]) -> anyhow::Result<Vec<PackedPoint>> {
        if let Some(bad) = positions.iter().position(|p| !p.is_finite()) {
            anyhow::bail!("Invalid beeswarm position at index {bad}: {}", positions[bad]);
        }

        let mut order: Vec<usize> = (0..positions.len()).collect();
        order.sort_by(|&a, &b| positions[a].total_cmp(&positions[b]));

        let diameter = self.diameter();
        let diameter2 = diameter * diameter;
        let tolerance = self.tolerance();
        let mut placed: Vec<PackedPoint> = Vec::with_capacity(positions.len());
        // Indices into `placed`.
        let mut window: VecDeque<usize> = VecDeque::new();

        for index in order {
            let position = positions[index];
            while let Some(&front) = window.front() {
                if placed[front].position < position - diameter {
                    window.pop_front();
                } else {
                    break;
                }
            }

            let intersects = |offset: f64| {
                window.iter().any(|&i| {
                    let other = &placed[i];
                    let dx = other.position - position;
                    let dy = other.offset - offset;
                    diameter2 - tolerance > dx * dx + dy * dy
                })
            };

            let mut offset = 0.0;
            if intersects(offset) {
                let mut best: Option<f64> = None;
                let mut highest = 0.0_f64;
                for &i in &window {
                    let other = &placed[i];
                    let dx = other.position - position;
                    let candidate = other.offset + (diameter2 - dx * dx).max(0.0).sqrt();
                    highest = highest.max(candidate);
                    if best.map_or(true, |b| candidate < b) && !intersects(candidate) {
                        best = Some(candidate);
                    }
                }
                // The highest tangent clears the whole window; rounding can
                // still make the test reject it.
                offset = best.unwrap_or(highest);
            }

            window.push_back(placed.len());
            placed.push(PackedPoint {
                index,
                position,
                offset,
            });
        }

        Ok(placed)
    }

    /// Pack arbitrary items, pairing each with its offset. Items come back in
    /// position order.
    pub fn pack_items<T, F>(&self, items: Vec<T>, position: F) -> anyhow::Result<Vec<(T, f64)>>
    where
        F: Fn(&T) -> f64,
    {
        let positions: Vec<f64> = items.iter().map(&position).collect();
        let packed = self.pack(&positions)?;
        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        Ok(packed
            .into_iter()
            .filter_map(|point| slots[point.index].take().map(|item| (item, point.offset)))
            .collect())
    }
}

/// Convenience wrapper around [`Beeswarm::pack`].
pub fn pack(positions: &[f64], radius: f64) -> anyhow::Result<Vec<PackedPoint>> {
    Beeswarm::new(radius)?.pack(positions)
}

/// Smallest pairwise center distance, for checking a layout.
pub fn min_separation(points: &[PackedPoint]) -> Option<f64> {
    let mut best: Option<f64> = None;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let d = (a.position - b.position).hypot(a.offset - b.offset);
            best = Some(best.map_or(d, |current| current.min(d)));
        }
    }
    best
}
