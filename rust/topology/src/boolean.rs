// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary of the boolean engine.
//!
//! The builder hands the engine a flat list of tagged curves and gets back
//! the planar subdivision they induce: split edge pieces and the regions
//! bounded by them. The engine is pure; every failure is an explicit
//! [`BoolError`] so the rebuild can abort before anything is written.

use crate::curve::Curve2d;

/// Options for one engine call.
///
/// `clean` and `scale_fix` are the policy flags every engine receives
/// verbatim. `arc_segments` is an extension for engines that flatten arcs;
/// engines working on exact curves ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolOptions {
    /// Drop bounded regions whose area is below the sliver threshold.
    pub clean: bool,
    /// Recentre coordinates on the input bounding box before computing.
    pub scale_fix: bool,
    /// Polyline segments per full turn for engines that flatten arcs.
    pub arc_segments: usize,
}

impl Default for BoolOptions {
    fn default() -> Self {
        Self {
            clean: true,
            scale_fix: false,
            arc_segments: 128,
        }
    }
}

/// One input curve.
#[derive(Debug, Clone, PartialEq)]
pub struct PointInEdge {
    pub curve: Curve2d,
    /// Name of the edge this curve came from.
    pub topology_id: String,
    /// Fill sources whose boundary this curve belongs to. Empty for curves
    /// that only split (open paths, split points).
    pub regions: Vec<usize>,
}

/// One piece of the subdivision.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolEdge {
    pub curve: Curve2d,
    /// Indices of the input curves this piece lies on.
    pub sources: Vec<usize>,
}

/// A directed use of a [`BoolEdge`] inside a region loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolCoedge {
    /// Index into [`BoolResult::edges`].
    pub edge: usize,
    pub reversed: bool,
}

/// A bounded region of the subdivision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolRegion {
    /// Counter-clockwise outer loop.
    pub outer: Vec<BoolCoedge>,
    /// Clockwise hole loops.
    pub holes: Vec<Vec<BoolCoedge>>,
    /// Fill sources whose area contains the region; empty means void.
    pub fills: Vec<usize>,
}

/// Output of one engine call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolResult {
    pub edges: Vec<BoolEdge>,
    pub regions: Vec<BoolRegion>,
}

impl BoolResult {
    /// Checks that every index refers to something that exists.
    pub fn check(&self, input_len: usize) -> Result<(), String> {
        for (i, edge) in self.edges.iter().enumerate() {
            if let Some(&s) = edge.sources.iter().find(|&&s| s >= input_len) {
                return Err(format!("edge {i} names input curve {s} of {input_len}"));
            }
        }
        for (r, region) in self.regions.iter().enumerate() {
            if region.outer.is_empty() {
                return Err(format!("region {r} has an empty outer loop"));
            }
            let loops = std::iter::once(&region.outer).chain(&region.holes);
            for lp in loops {
                if let Some(c) = lp.iter().find(|c| c.edge >= self.edges.len()) {
                    return Err(format!(
                        "region {r} uses edge {} of {}",
                        c.edge,
                        self.edges.len()
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Errors the engine reports at the call boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoolError {
    /// An input curve has non-finite coordinates.
    #[error("input curve {0} has non-finite coordinates")]
    NonFinite(usize),

    /// Fill sources were given but no bounded region came out.
    #[error("no bounded regions in the result")]
    NoRegions,

    /// Any other engine failure.
    #[error("{0}")]
    Failed(String),
}

/// A polygon boolean engine over lines and arcs.
pub trait BooleanEngine {
    /// Computes the planar subdivision of `edges` in one shot.
    fn exbool(
        &self,
        edges: &[PointInEdge],
        tolerance: f64,
        options: BoolOptions,
    ) -> Result<BoolResult, BoolError>;
}

impl<E: BooleanEngine + ?Sized> BooleanEngine for &E {
    fn exbool(
        &self,
        edges: &[PointInEdge],
        tolerance: f64,
        options: BoolOptions,
    ) -> Result<BoolResult, BoolError> {
        (**self).exbool(edges, tolerance, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn piece() -> BoolEdge {
        BoolEdge {
            curve: Curve2d::line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)),
            sources: vec![0],
        }
    }

    #[test]
    fn check_accepts_consistent_result() {
        let result = BoolResult {
            edges: vec![piece()],
            regions: vec![BoolRegion {
                outer: vec![BoolCoedge {
                    edge: 0,
                    reversed: false,
                }],
                holes: Vec::new(),
                fills: vec![0],
            }],
        };
        assert!(result.check(1).is_ok());
        assert!(result.check(0).is_err());
    }

    #[test]
    fn check_rejects_dangling_edge_index() {
        let result = BoolResult {
            edges: vec![piece()],
            regions: vec![BoolRegion {
                outer: vec![BoolCoedge {
                    edge: 3,
                    reversed: true,
                }],
                ..Default::default()
            }],
        };
        assert!(result.check(1).unwrap_err().contains("edge 3"));
    }
}
