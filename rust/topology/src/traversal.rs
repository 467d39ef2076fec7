// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal methods for navigating the sketch graph.
//!
//! Supports downward traversal (face → wires → coedges → edges → points) by
//! walking coedge rings, and upward traversal (point → edges → faces) via
//! the adjacency index and the coedge → wire → face links.

use nalgebra::Point2;
use rustc_hash::FxHashSet;

use crate::arena::Sketch;
use crate::curve::Curve2d;
use crate::error::{Error, Result};
use crate::keys::*;

// =============================================================================
// Coedge helpers
// =============================================================================

impl<P> Sketch<P> {
    /// Point a coedge starts at, respecting its direction.
    pub fn coedge_start(&self, key: CoedgeKey) -> Option<PointKey> {
        let c = self.coedges.get(key)?;
        let e = self.edges.get(c.edge)?;
        Some(if c.reversed { e.end } else { e.start })
    }

    /// Point a coedge ends at, respecting its direction.
    pub fn coedge_end(&self, key: CoedgeKey) -> Option<PointKey> {
        let c = self.coedges.get(key)?;
        let e = self.edges.get(c.edge)?;
        Some(if c.reversed { e.start } else { e.end })
    }

    /// The edge curve oriented along the coedge.
    pub fn coedge_curve(&self, key: CoedgeKey) -> Option<Curve2d> {
        let c = self.coedges.get(key)?;
        let e = self.edges.get(c.edge)?;
        Some(if c.reversed {
            e.curve.reversed()
        } else {
            e.curve
        })
    }

    /// Returns the face a coedge bounds.
    pub fn find_face_by_coedge(&self, key: CoedgeKey) -> Option<FaceKey> {
        let c = self.coedges.get(key)?;
        self.wires.get(c.wire)?.face
    }
}

// =============================================================================
// Downward traversal
// =============================================================================

impl<P> Sketch<P> {
    /// Returns the start and end point keys of an edge.
    pub fn edge_points(&self, key: EdgeKey) -> Option<(PointKey, PointKey)> {
        self.edges.get(key).map(|e| (e.start, e.end))
    }

    /// Returns the coedges of a wire in ring order, starting at `first`.
    ///
    /// Stops after `len` steps so a corrupted ring can never loop forever.
    pub fn wire_coedges(&self, key: WireKey) -> Option<Vec<CoedgeKey>> {
        let wire = self.wires.get(key)?;
        let mut out = Vec::with_capacity(wire.len);
        let mut ck = wire.first;
        for _ in 0..wire.len {
            out.push(ck);
            ck = self.coedges.get(ck)?.next;
        }
        Some(out)
    }

    /// Returns the point keys of a wire in traversal order (coedge starts).
    pub fn wire_points_ordered(&self, key: WireKey) -> Option<Vec<PointKey>> {
        self.wire_coedges(key)?
            .into_iter()
            .map(|ck| self.coedge_start(ck))
            .collect()
    }

    /// Returns the oriented curves of a wire in traversal order.
    pub fn wire_curves(&self, key: WireKey) -> Option<Vec<Curve2d>> {
        self.wire_coedges(key)?
            .into_iter()
            .map(|ck| self.coedge_curve(ck))
            .collect()
    }

    /// Returns all wires of a face, outer first.
    pub fn face_wires(&self, key: FaceKey) -> Option<Vec<WireKey>> {
        let face = self.faces.get(key)?;
        let mut wires = Vec::with_capacity(1 + face.holes.len());
        wires.push(face.outer);
        wires.extend_from_slice(&face.holes);
        Some(wires)
    }

    /// Returns all coedges of a face, outer wire first.
    pub fn face_coedges(&self, key: FaceKey) -> Option<Vec<CoedgeKey>> {
        let mut out = Vec::new();
        for wk in self.face_wires(key)? {
            out.extend(self.wire_coedges(wk)?);
        }
        Some(out)
    }

    /// Returns all unique edge keys of a face.
    pub fn face_edges(&self, key: FaceKey) -> Option<FxHashSet<EdgeKey>> {
        let mut set = FxHashSet::default();
        for ck in self.face_coedges(key)? {
            set.insert(self.coedges.get(ck)?.edge);
        }
        Some(set)
    }

    /// Returns all unique point keys of a face.
    pub fn face_points(&self, key: FaceKey) -> Option<FxHashSet<PointKey>> {
        let mut set = FxHashSet::default();
        for ek in self.face_edges(key)? {
            let (s, e) = self.edge_points(ek)?;
            set.insert(s);
            set.insert(e);
        }
        Some(set)
    }

    /// Positions of every live point, in arena order.
    pub fn get_all_points(&self) -> Vec<Point2<f64>> {
        self.points.values().map(|p| p.position).collect()
    }
}

// =============================================================================
// Upward traversal
// =============================================================================

impl<P> Sketch<P> {
    /// Returns the edges that use a point.
    pub fn point_edges(&self, key: PointKey) -> Option<&FxHashSet<EdgeKey>> {
        self.point_to_edges.get(&key)
    }

    /// Returns the faces bounded by an edge (zero, one or two).
    pub fn edge_faces(&self, key: EdgeKey) -> Option<Vec<FaceKey>> {
        let edge = self.edges.get(key)?;
        let mut faces = Vec::with_capacity(2);
        for &ck in &edge.coedges {
            if let Some(fk) = self.find_face_by_coedge(ck) {
                if !faces.contains(&fk) {
                    faces.push(fk);
                }
            }
        }
        Some(faces)
    }

    /// Returns the faces that share at least one edge with `key`.
    pub fn adjacent_faces(&self, key: FaceKey) -> Option<FxHashSet<FaceKey>> {
        let mut set = FxHashSet::default();
        for ck in self.face_coedges(key)? {
            let Some(partner) = self.coedges.get(ck)?.partner else {
                continue;
            };
            if let Some(fk) = self.find_face_by_coedge(partner) {
                if fk != key {
                    set.insert(fk);
                }
            }
        }
        Some(set)
    }

    /// Returns the faces incident to a point.
    pub fn point_faces(&self, key: PointKey) -> Option<FxHashSet<FaceKey>> {
        let mut set = FxHashSet::default();
        for &ek in self.point_edges(key)? {
            set.extend(self.edge_faces(ek)?);
        }
        Some(set)
    }

    /// Resolves any key to the faces it belongs to.
    pub fn faces_of(&self, key: TopologyKey) -> Result<Vec<FaceKey>> {
        let faces = match key {
            TopologyKey::Face(fk) => self.faces.contains_key(fk).then(|| vec![fk]),
            TopologyKey::Wire(wk) => self.wires.get(wk).map(|w| w.face.into_iter().collect()),
            TopologyKey::Coedge(ck) => self
                .coedges
                .get(ck)
                .map(|_| self.find_face_by_coedge(ck).into_iter().collect()),
            TopologyKey::Edge(ek) => self.edge_faces(ek),
            TopologyKey::Point(pk) => self
                .point_faces(pk)
                .map(|set| set.into_iter().collect()),
            TopologyKey::GuideLine(_) => None,
        };
        faces.ok_or(Error::NotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::BuilderRegion;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    fn two_rooms() -> Sketch {
        let mut sketch: Sketch = Sketch::new();
        let a = BuilderRegion::polygon(
            "A",
            &[p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(0.0, 3.0)],
        );
        let b = BuilderRegion::polygon(
            "B",
            &[p(4.0, 0.0), p(8.0, 0.0), p(8.0, 3.0), p(4.0, 3.0)],
        );
        sketch.create_builder().add_regions(vec![a, b]).unwrap();
        sketch
    }

    #[test]
    fn wire_walk_matches_ring_length() {
        let sketch = two_rooms();
        let fa = sketch.face_by_name("A").unwrap();
        let outer = sketch.face(fa).unwrap().outer;
        let coedges = sketch.wire_coedges(outer).unwrap();
        assert_eq!(coedges.len(), 4);
        assert_eq!(sketch.wire_points_ordered(outer).unwrap().len(), 4);
        for &ck in &coedges {
            assert_eq!(sketch.find_face_by_coedge(ck), Some(fa));
        }
    }

    #[test]
    fn shared_edge_links_both_faces() {
        let sketch = two_rooms();
        let fa = sketch.face_by_name("A").unwrap();
        let fb = sketch.face_by_name("B").unwrap();

        let adjacent = sketch.adjacent_faces(fa).unwrap();
        assert_eq!(adjacent.len(), 1);
        assert!(adjacent.contains(&fb));

        let shared: Vec<EdgeKey> = sketch
            .face_edges(fa)
            .unwrap()
            .intersection(&sketch.face_edges(fb).unwrap())
            .copied()
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(sketch.edge_faces(shared[0]).unwrap().len(), 2);
    }

    #[test]
    fn corner_point_touches_both_faces() {
        let sketch = two_rooms();
        let corner = sketch
            .points()
            .find(|(_, d)| d.position == p(4.0, 0.0))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(sketch.point_faces(corner).unwrap().len(), 2);
        assert_eq!(sketch.faces_of(corner.into()).unwrap().len(), 2);
    }

    #[test]
    fn stale_key_is_not_found() {
        let sketch = two_rooms();
        let fa = sketch.face_by_name("A").unwrap();
        let mut other = sketch.clone();
        other.create_builder().clear().unwrap();
        assert!(matches!(
            other.faces_of(fa.into()),
            Err(Error::NotFound(_))
        ));
    }
}
