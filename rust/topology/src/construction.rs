// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Construction methods for sketch entities.
//!
//! Every entity is created through the sketch, which checks referential
//! integrity (all referenced sub-entities must exist), maintains the upward
//! point → edge index and threads the coedge rings. Construction is only
//! used by the synchronizer while it assembles a fresh generation, so none
//! of these methods are public.

use nalgebra::Point2;
use slotmap::Key;

use crate::arena::*;
use crate::curve::Curve2d;
use crate::error::{Error, Result};
use crate::keys::*;

impl<P> Sketch<P> {
    /// Inserts a canonical point. Deduplication happens upstream in the
    /// point encoder; this never merges.
    pub(crate) fn add_point(&mut self, position: Point2<f64>) -> PointKey {
        self.points.insert(PointData { position })
    }

    /// Creates an edge between two existing points.
    ///
    /// Returns an error if either point does not exist.
    pub(crate) fn add_edge(
        &mut self,
        start: PointKey,
        end: PointKey,
        curve: Curve2d,
        name: String,
        sources: Vec<String>,
    ) -> Result<EdgeKey> {
        if !self.points.contains_key(start) {
            return Err(Error::PointNotFound(start));
        }
        if !self.points.contains_key(end) {
            return Err(Error::PointNotFound(end));
        }

        let key = self.edges.insert(EdgeData {
            start,
            end,
            curve,
            name,
            sources,
            coedges: Vec::with_capacity(2),
        });
        self.link_point_edge(start, key);
        self.link_point_edge(end, key);
        Ok(key)
    }

    /// Creates a closed wire from `(edge, reversed)` pairs in traversal order.
    ///
    /// Each coedge must start where the previous one ends, and the last must
    /// end where the first starts. An edge that already carries a coedge gets
    /// the new one as its partner; the two must run in opposite directions.
    pub(crate) fn add_wire(&mut self, ring: &[(EdgeKey, bool)]) -> Result<WireKey> {
        if ring.is_empty() {
            return Err(Error::EmptyWire);
        }

        // Validate edges and usage before touching anything
        for (i, &(ek, reversed)) in ring.iter().enumerate() {
            let edge = self.edges.get(ek).ok_or(Error::EdgeNotFound(ek))?;
            let earlier: Vec<bool> = ring[..i]
                .iter()
                .filter(|(e, _)| *e == ek)
                .map(|&(_, r)| r)
                .collect();
            if edge.coedges.len() + earlier.len() >= 2 {
                return Err(Error::EdgeOverused(ek));
            }
            let same_direction = earlier.contains(&reversed)
                || edge
                    .coedges
                    .first()
                    .is_some_and(|&ck| self.coedges[ck].reversed == reversed);
            if same_direction {
                return Err(Error::InvariantViolation(format!(
                    "edge {ek:?} traversed twice in the same direction"
                )));
            }
        }

        // Check that the ring is connected end to end
        let n = ring.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let (a, a_rev) = ring[i];
            let (b, b_rev) = ring[j];
            let a_end = self.oriented_end(a, a_rev);
            let b_start = self.oriented_start(b, b_rev);
            if a_end != b_start {
                return Err(Error::DisconnectedWire(i, j));
            }
        }

        let wire = self.wires.insert(WireData {
            first: CoedgeKey::null(),
            len: n,
            face: None,
        });

        let keys: Vec<CoedgeKey> = ring
            .iter()
            .map(|&(edge, reversed)| {
                self.coedges.insert(CoedgeData {
                    edge,
                    reversed,
                    wire,
                    next: CoedgeKey::null(),
                    prev: CoedgeKey::null(),
                    partner: None,
                })
            })
            .collect();

        for i in 0..n {
            let ck = keys[i];
            let c = &mut self.coedges[ck];
            c.next = keys[(i + 1) % n];
            c.prev = keys[(i + n - 1) % n];
        }
        self.wires[wire].first = keys[0];

        for (&(ek, _), &ck) in ring.iter().zip(&keys) {
            let existing = self.edges[ek].coedges.first().copied();
            self.edges[ek].coedges.push(ck);
            if let Some(other) = existing {
                self.link_partners(other, ck)?;
            }
        }

        Ok(wire)
    }

    /// Creates a face from an outer wire and hole wires.
    pub(crate) fn add_face(
        &mut self,
        outer: WireKey,
        holes: Vec<WireKey>,
        name: String,
        sources: Vec<String>,
        payload: Option<P>,
    ) -> Result<FaceKey> {
        for &wk in std::iter::once(&outer).chain(&holes) {
            let wire = self.wires.get(wk).ok_or(Error::WireNotFound(wk))?;
            if wire.face.is_some() {
                return Err(Error::InvariantViolation(format!(
                    "wire {wk:?} already bounds a face"
                )));
            }
        }

        let key = self.faces.insert(FaceData {
            outer,
            holes: holes.clone(),
            name,
            sources,
            payload,
        });

        self.wires[outer].face = Some(key);
        for wk in holes {
            self.wires[wk].face = Some(key);
        }
        Ok(key)
    }

    /// Marks two coedges of the same edge as partners.
    ///
    /// Returns an error if they traverse different edges or run in the same
    /// direction.
    pub(crate) fn link_partners(&mut self, a: CoedgeKey, b: CoedgeKey) -> Result<()> {
        let ca = self.coedges.get(a).ok_or(Error::CoedgeNotFound(a))?;
        let cb = self.coedges.get(b).ok_or(Error::CoedgeNotFound(b))?;
        if ca.edge != cb.edge {
            return Err(Error::InvariantViolation(format!(
                "coedges {a:?} and {b:?} traverse different edges"
            )));
        }
        if ca.reversed == cb.reversed {
            return Err(Error::InvariantViolation(format!(
                "coedges {a:?} and {b:?} run in the same direction along {:?}",
                ca.edge
            )));
        }
        self.coedges[a].partner = Some(b);
        self.coedges[b].partner = Some(a);
        Ok(())
    }

    fn oriented_start(&self, edge: EdgeKey, reversed: bool) -> PointKey {
        let e = &self.edges[edge];
        if reversed {
            e.end
        } else {
            e.start
        }
    }

    fn oriented_end(&self, edge: EdgeKey, reversed: bool) -> PointKey {
        let e = &self.edges[edge];
        if reversed {
            e.start
        } else {
            e.end
        }
    }
}
