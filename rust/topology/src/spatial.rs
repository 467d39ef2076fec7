// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quantised point encoding for tolerance-based point deduplication.
//!
//! Uses a grid-based spatial hash whose cell size is the build tolerance.
//! Every curve end point of a rebuild is encoded once; points within
//! tolerance of an earlier point collapse onto that earlier canonical point.
//! The encoder lives for exactly one pipeline run.

use nalgebra::Point2;
use rustc_hash::FxHashMap;

/// Quantised spatial key: the grid cell containing a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointCode(pub i64, pub i64);

/// Index of a canonical point inside a [`PointEncoder`].
pub type CanonicalId = usize;

/// A spatial hash grid mapping quantised keys to canonical points.
///
/// Lookups check the 3x3 neighbourhood of cells so that two points closer
/// than the tolerance always resolve to the same canonical point, even when
/// they straddle a cell boundary.
#[derive(Debug, Clone)]
pub struct PointEncoder {
    tolerance: f64,
    grid: FxHashMap<PointCode, Vec<CanonicalId>>,
    canonical: Vec<Point2<f64>>,
}

impl PointEncoder {
    /// Creates an empty encoder quantising at `tolerance`.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(1e-12),
            grid: FxHashMap::default(),
            canonical: Vec::new(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Quantised key of an arbitrary location.
    pub fn code_of(&self, p: &Point2<f64>) -> PointCode {
        PointCode(
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
        )
    }

    /// Returns the canonical point within tolerance of `p`, if any.
    ///
    /// The closest candidate wins; equal distances resolve to the earliest
    /// encoded point.
    pub fn find(&self, p: &Point2<f64>) -> Option<CanonicalId> {
        let PointCode(cx, cy) = self.code_of(p);
        let tol_sq = self.tolerance * self.tolerance;
        let mut best: Option<(f64, CanonicalId)> = None;

        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(ids) = self.grid.get(&PointCode(cx + dx, cy + dy)) else {
                    continue;
                };
                for &id in ids {
                    let dist_sq = (self.canonical[id] - p).norm_squared();
                    if dist_sq > tol_sq {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((d, b)) => dist_sq < d || (dist_sq == d && id < b),
                    };
                    if better {
                        best = Some((dist_sq, id));
                    }
                }
            }
        }

        best.map(|(_, id)| id)
    }

    /// Returns the canonical point for `p`, registering `p` as a new
    /// canonical point if nothing lies within tolerance.
    pub fn encode(&mut self, p: Point2<f64>) -> CanonicalId {
        if let Some(existing) = self.find(&p) {
            return existing;
        }
        let id = self.canonical.len();
        self.canonical.push(p);
        let code = self.code_of(&p);
        self.grid.entry(code).or_default().push(id);
        id
    }

    /// Location of a canonical point.
    pub fn position(&self, id: CanonicalId) -> Point2<f64> {
        self.canonical[id]
    }

    /// Quantised key of a canonical point.
    pub fn code(&self, id: CanonicalId) -> PointCode {
        self.code_of(&self.canonical[id])
    }

    /// Number of canonical points.
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_collapse() {
        let mut enc = PointEncoder::new(1e-6);
        let a = enc.encode(Point2::new(4.0, 0.0));
        let b = enc.encode(Point2::new(4.0 + 4e-7, -3e-7));
        assert_eq!(a, b);
        assert_eq!(enc.len(), 1);
        assert_eq!(enc.position(b), Point2::new(4.0, 0.0));
    }

    #[test]
    fn points_across_cell_boundary_collapse() {
        let mut enc = PointEncoder::new(1.0);
        // 0.99 and 1.01 fall in different cells but are within tolerance.
        let a = enc.encode(Point2::new(0.99, 0.5));
        let b = enc.encode(Point2::new(1.01, 0.5));
        assert_eq!(a, b);
    }

    #[test]
    fn distant_points_stay_distinct() {
        let mut enc = PointEncoder::new(1e-6);
        let a = enc.encode(Point2::new(0.0, 0.0));
        let b = enc.encode(Point2::new(1e-3, 0.0));
        assert_ne!(a, b);
        assert_eq!(enc.len(), 2);
        assert!(enc.find(&Point2::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn closest_canonical_wins() {
        let mut enc = PointEncoder::new(1.0);
        let a = enc.encode(Point2::new(0.0, 0.0));
        let b = enc.encode(Point2::new(1.5, 0.0));
        assert_eq!(enc.find(&Point2::new(1.0, 0.0)), Some(b));
        assert_eq!(enc.find(&Point2::new(0.4, 0.0)), Some(a));
    }
}
