// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! External description of boundary loops.
//!
//! [`BuilderRegion`] is the transfer shape callers use to hand loops to the
//! builder and the shape [`Sketch::get_all_builder_regions`] reports faces
//! back in. It is not part of the live graph.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::arena::Sketch;
use crate::curve::Curve2d;
use crate::keys::{FaceKey, WireKey};

/// One boundary curve with the topology name of the edge it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderCurve {
    pub curve: Curve2d,
    /// Empty means "assign a fresh name".
    #[serde(default)]
    pub topology_id: String,
}

impl BuilderCurve {
    pub fn new(curve: Curve2d, topology_id: impl Into<String>) -> Self {
        Self {
            curve,
            topology_id: topology_id.into(),
        }
    }

    /// A curve without an edge name.
    pub fn anonymous(curve: Curve2d) -> Self {
        Self::new(curve, String::new())
    }
}

/// A closed outer loop with optional holes and the topology name of the face
/// it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderRegion {
    pub outer: Vec<BuilderCurve>,
    #[serde(default)]
    pub holes: Vec<Vec<BuilderCurve>>,
    /// Empty means "assign a fresh name".
    #[serde(default)]
    pub topology_id: String,
}

impl BuilderRegion {
    /// Region bounded by `outer` with no holes.
    pub fn new(topology_id: impl Into<String>, outer: Vec<BuilderCurve>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
            topology_id: topology_id.into(),
        }
    }

    /// Closed polygon through `corners`, with unnamed edges.
    pub fn polygon(topology_id: impl Into<String>, corners: &[Point2<f64>]) -> Self {
        let n = corners.len();
        let outer = (0..n)
            .map(|i| BuilderCurve::anonymous(Curve2d::line(corners[i], corners[(i + 1) % n])))
            .collect();
        Self::new(topology_id, outer)
    }

    /// Full circle as two counter-clockwise half arcs.
    pub fn circle(topology_id: impl Into<String>, center: Point2<f64>, radius: f64) -> Self {
        let outer = Curve2d::circle(center, radius)
            .into_iter()
            .map(BuilderCurve::anonymous)
            .collect();
        Self::new(topology_id, outer)
    }

    /// Adds a hole loop.
    pub fn with_hole(mut self, hole: Vec<BuilderCurve>) -> Self {
        self.holes.push(hole);
        self
    }

    /// Every loop, outer first.
    pub fn loops(&self) -> impl Iterator<Item = &Vec<BuilderCurve>> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    /// Every curve of every loop.
    pub fn curves(&self) -> impl Iterator<Item = &BuilderCurve> {
        self.loops().flatten()
    }

    /// Same region moved by `offset`.
    pub fn translated(&self, offset: &Vector2<f64>) -> Self {
        let shift = |lp: &Vec<BuilderCurve>| -> Vec<BuilderCurve> {
            lp.iter()
                .map(|c| BuilderCurve::new(c.curve.translated(offset), c.topology_id.clone()))
                .collect()
        };
        Self {
            outer: shift(&self.outer),
            holes: self.holes.iter().map(shift).collect(),
            topology_id: self.topology_id.clone(),
        }
    }
}

impl<P> Sketch<P> {
    /// The face as a [`BuilderRegion`]: oriented wire curves carrying their
    /// edge names, and the face name.
    pub fn builder_region(&self, face: FaceKey) -> Option<BuilderRegion> {
        let data = self.faces.get(face)?;
        let describe = |wire: WireKey| -> Option<Vec<BuilderCurve>> {
            self.wire_coedges(wire)?
                .into_iter()
                .map(|ck| {
                    let edge = self.edges.get(self.coedges.get(ck)?.edge)?;
                    Some(BuilderCurve::new(self.coedge_curve(ck)?, edge.name.clone()))
                })
                .collect()
        };
        let outer = describe(data.outer)?;
        let holes = data
            .holes
            .iter()
            .map(|&wk| describe(wk))
            .collect::<Option<Vec<_>>>()?;
        Some(BuilderRegion {
            outer,
            holes,
            topology_id: data.name.clone(),
        })
    }

    /// Every face as a [`BuilderRegion`], in arena order.
    pub fn get_all_builder_regions(&self) -> Vec<BuilderRegion> {
        self.faces
            .keys()
            .filter_map(|fk| self.builder_region(fk))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn polygon_closes_its_loop() {
        let r = BuilderRegion::polygon("A", &[p(0.0, 0.0), p(2.0, 0.0), p(2.0, 1.0)]);
        assert_eq!(r.outer.len(), 3);
        assert_eq!(r.outer[2].curve.end(), p(0.0, 0.0));
        assert_eq!(r.curves().count(), 3);
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let r = BuilderRegion::polygon("room", &[p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["topologyId"], "room");
        assert_eq!(json["outer"][0]["curve"]["type"], "line");
        assert!(json["holes"].as_array().unwrap().is_empty());

        let back: BuilderRegion = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn missing_ids_default_to_empty() {
        let json = serde_json::json!({
            "outer": [
                { "curve": { "type": "line", "start": [0.0, 0.0], "end": [1.0, 0.0] } },
                { "curve": { "type": "line", "start": [1.0, 0.0], "end": [0.0, 1.0] } },
                { "curve": { "type": "line", "start": [0.0, 1.0], "end": [0.0, 0.0] } }
            ]
        });
        let r: BuilderRegion = serde_json::from_value(json).unwrap();
        assert!(r.topology_id.is_empty());
        assert!(r.outer.iter().all(|c| c.topology_id.is_empty()));
    }

    #[test]
    fn translated_keeps_names() {
        let r = BuilderRegion::circle("disc", p(0.0, 0.0), 1.0);
        let moved = r.translated(&Vector2::new(3.0, 0.0));
        assert_eq!(moved.topology_id, "disc");
        assert!((moved.outer[0].curve.start() - p(4.0, 0.0)).norm() < 1e-12);
    }
}
