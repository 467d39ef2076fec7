// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural invariant checks for a sketch generation.

use rustc_hash::FxHashSet;

use crate::arena::Sketch;
use crate::error::{Error, Result};
use crate::geometry::point_in_curves;
use crate::keys::*;
use crate::spatial::PointEncoder;

fn violation(msg: String) -> Error {
    Error::InvariantViolation(msg)
}

impl<P> Sketch<P> {
    /// Checks every structural invariant of the graph.
    ///
    /// - coedge rings close and `next.prev` is the coedge itself; every
    ///   coedge is in exactly one wire and consecutive coedges share a point
    /// - an edge has at most two coedges, and two are mutual partners
    ///   running in opposite directions
    /// - outer wires are counter-clockwise, holes clockwise and inside the
    ///   outer wire without overlapping each other
    /// - face names and edge names are unique
    /// - no two points lie within `tolerance` of each other
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        self.validate_rings()?;
        self.validate_edges()?;
        self.validate_faces()?;
        self.validate_names()?;
        self.validate_points(tolerance)
    }

    fn validate_rings(&self) -> Result<()> {
        let mut seen: FxHashSet<CoedgeKey> = FxHashSet::default();
        for (wk, wire) in &self.wires {
            let mut ck = wire.first;
            for _ in 0..wire.len {
                let coedge = self.coedges.get(ck).ok_or(Error::CoedgeNotFound(ck))?;
                if coedge.wire != wk {
                    return Err(violation(format!(
                        "coedge {ck:?} is linked from wire {wk:?} but belongs elsewhere"
                    )));
                }
                if !seen.insert(ck) {
                    return Err(violation(format!("coedge {ck:?} appears twice")));
                }
                let next = self.coedges.get(coedge.next).ok_or(Error::CoedgeNotFound(coedge.next))?;
                if next.prev != ck {
                    return Err(violation(format!("next.prev of coedge {ck:?} is not itself")));
                }
                if self.coedge_end(ck) != self.coedge_start(coedge.next) {
                    return Err(violation(format!("wire {wk:?} breaks after coedge {ck:?}")));
                }
                ck = coedge.next;
            }
            if ck != wire.first {
                return Err(violation(format!(
                    "wire {wk:?} does not close after {} coedges",
                    wire.len
                )));
            }
        }
        if seen.len() != self.coedges.len() {
            return Err(violation(format!(
                "{} coedges are not in any wire",
                self.coedges.len() - seen.len()
            )));
        }
        Ok(())
    }

    fn validate_edges(&self) -> Result<()> {
        for (ek, edge) in &self.edges {
            match edge.coedges[..] {
                [] | [_] => {}
                [a, b] => {
                    let (ca, cb) = (&self.coedges[a], &self.coedges[b]);
                    if ca.partner != Some(b) || cb.partner != Some(a) {
                        return Err(violation(format!("coedges of edge {ek:?} are not partners")));
                    }
                    if ca.reversed == cb.reversed {
                        return Err(violation(format!(
                            "coedges of edge {ek:?} run in the same direction"
                        )));
                    }
                }
                _ => return Err(Error::EdgeOverused(ek)),
            }
            if edge.coedges.iter().any(|&ck| self.coedges.get(ck).map(|c| c.edge) != Some(ek)) {
                return Err(violation(format!("edge {ek:?} lists a coedge of another edge")));
            }
        }
        Ok(())
    }

    fn validate_faces(&self) -> Result<()> {
        for (fk, face) in &self.faces {
            for &wk in std::iter::once(&face.outer).chain(&face.holes) {
                let wire = self.wires.get(wk).ok_or(Error::WireNotFound(wk))?;
                if wire.face != Some(fk) {
                    return Err(violation(format!(
                        "wire {wk:?} does not point back to face {fk:?}"
                    )));
                }
            }

            let outer = self.wire_curves(face.outer).ok_or(Error::WireNotFound(face.outer))?;
            if self.wire_signed_area(face.outer).unwrap_or(0.0) <= 0.0 {
                return Err(violation(format!(
                    "outer wire of face '{}' is not counter-clockwise",
                    face.name
                )));
            }

            let mut samples = Vec::with_capacity(face.holes.len());
            for &wk in &face.holes {
                if self.wire_signed_area(wk).unwrap_or(0.0) >= 0.0 {
                    return Err(violation(format!("hole of face '{}' is not clockwise", face.name)));
                }
                let curves = self.wire_curves(wk).ok_or(Error::WireNotFound(wk))?;
                let sample = curves
                    .iter()
                    .max_by(|a, b| a.length().total_cmp(&b.length()))
                    .map(|c| c.midpoint())
                    .ok_or(Error::EmptyWire)?;
                if !point_in_curves(&sample, &outer) {
                    return Err(violation(format!(
                        "hole of face '{}' leaves the outer wire",
                        face.name
                    )));
                }
                samples.push((sample, curves));
            }
            for (i, (sample, _)) in samples.iter().enumerate() {
                let overlaps = samples
                    .iter()
                    .enumerate()
                    .any(|(j, (_, other))| i != j && point_in_curves(sample, other));
                if overlaps {
                    return Err(violation(format!("holes of face '{}' overlap", face.name)));
                }
            }
        }
        Ok(())
    }

    fn validate_names(&self) -> Result<()> {
        let mut faces = FxHashSet::default();
        if let Some(f) = self.faces.values().find(|f| !faces.insert(f.name.as_str())) {
            return Err(violation(format!("face name '{}' is used twice", f.name)));
        }
        let mut edges = FxHashSet::default();
        if let Some(e) = self.edges.values().find(|e| !edges.insert(e.name.as_str())) {
            return Err(violation(format!("edge name '{}' is used twice", e.name)));
        }
        Ok(())
    }

    fn validate_points(&self, tolerance: f64) -> Result<()> {
        let mut encoder = PointEncoder::new(tolerance);
        for point in self.points.values() {
            encoder.encode(point.position);
        }
        if encoder.len() != self.points.len() {
            return Err(violation(format!(
                "{} points coincide within {tolerance}",
                self.points.len() - encoder.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve2d;
    use nalgebra::Point2;

    const TOL: f64 = 1e-6;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    /// Hand-built square face; `ccw` picks the outer wire direction.
    fn square(ccw: bool) -> Sketch {
        let mut sketch = Sketch::new();
        let corners = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)];
        let keys: Vec<PointKey> = corners.iter().map(|&c| sketch.add_point(c)).collect();
        let edges: Vec<EdgeKey> = (0..4)
            .map(|i| {
                let (a, b) = (keys[i], keys[(i + 1) % 4]);
                let curve = Curve2d::line(corners[i], corners[(i + 1) % 4]);
                sketch.add_edge(a, b, curve, format!("e{i}"), Vec::new()).unwrap()
            })
            .collect();
        let ring: Vec<(EdgeKey, bool)> = if ccw {
            edges.iter().map(|&e| (e, false)).collect()
        } else {
            edges.iter().rev().map(|&e| (e, true)).collect()
        };
        let wire = sketch.add_wire(&ring).unwrap();
        sketch.add_face(wire, Vec::new(), "F".into(), Vec::new(), None).unwrap();
        sketch
    }

    #[test]
    fn built_sketch_is_valid() {
        assert!(square(true).validate(TOL).is_ok());
    }

    #[test]
    fn clockwise_outer_is_rejected() {
        let err = square(false).validate(TOL).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(msg) if msg.contains("counter-clockwise")));
    }

    #[test]
    fn coincident_points_are_rejected() {
        let mut sketch = square(true);
        sketch.add_point(p(2.0, 2.0 + 1e-8));
        assert!(matches!(sketch.validate(TOL), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn duplicate_edge_names_are_rejected() {
        let mut sketch = square(true);
        let ek = sketch.edge_by_name("e1").unwrap();
        sketch.edges[ek].name = "e0".into();
        let err = sketch.validate(TOL).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(msg) if msg.contains("e0")));
    }

    #[test]
    fn broken_ring_is_rejected() {
        let mut sketch = square(true);
        let wk = sketch.wires.keys().next().unwrap();
        let first = sketch.wires[wk].first;
        let next = sketch.coedges[first].next;
        sketch.coedges[next].prev = next;
        assert!(matches!(sketch.validate(TOL), Err(Error::InvariantViolation(_))));
    }
}
