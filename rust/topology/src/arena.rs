// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for the sketch boundary representation.
//!
//! The [`Sketch`] is the aggregate root that owns every point, edge, coedge,
//! wire and face of one generation of the sketch graph, plus the guide lines
//! that live beside it. Entities live inside slot maps with stable,
//! generational keys; the cyclic links of the half-edge structure
//! (`next`/`prev`/`partner`, coedge → wire → face) are plain key fields, so
//! there is no ownership cycle.
//!
//! ## Generations
//!
//! A rebuild never patches a sketch in place. It constructs a fresh `Sketch`
//! and the host swaps it in. Face and edge *names* are what survive across
//! generations; keys are only valid for the generation that issued them.

use nalgebra::Point2;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::curve::Curve2d;
use crate::error::{Error, Result};
use crate::keys::*;
use crate::naming::NameAllocator;
use crate::region::BuilderRegion;

/// Data stored for a point: a canonical 2D location.
#[derive(Debug, Clone)]
pub struct PointData {
    pub position: Point2<f64>,
}

/// Data stored for an edge: a curve between two canonical points, used by
/// at most two coedges.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub start: PointKey,
    pub end: PointKey,
    pub curve: Curve2d,
    /// Stable topology name.
    pub name: String,
    /// Names of the edges this one was derived from, largest overlap first.
    pub sources: Vec<String>,
    pub coedges: Vec<CoedgeKey>,
}

/// Data stored for a coedge: one directed traversal of an edge.
#[derive(Debug, Clone)]
pub struct CoedgeData {
    pub edge: EdgeKey,
    /// `true` when the coedge runs from the edge's end to its start.
    pub reversed: bool,
    pub wire: WireKey,
    pub next: CoedgeKey,
    pub prev: CoedgeKey,
    /// Oppositely directed coedge of the same edge on the neighbouring face.
    pub partner: Option<CoedgeKey>,
}

/// Data stored for a wire: a closed ring of coedges.
#[derive(Debug, Clone)]
pub struct WireData {
    pub first: CoedgeKey,
    pub len: usize,
    pub face: Option<FaceKey>,
}

/// Data stored for a face: an outer wire, hole wires, a stable name and the
/// caller's opaque payload.
#[derive(Debug, Clone)]
pub struct FaceData<P> {
    pub outer: WireKey,
    pub holes: Vec<WireKey>,
    /// Stable topology name.
    pub name: String,
    /// Names of the prior faces and inputs this face covers, largest overlap first.
    pub sources: Vec<String>,
    pub payload: Option<P>,
}

/// A decorative curve that never bounds a face.
#[derive(Debug, Clone)]
pub struct GuideLineData {
    pub curve: Curve2d,
    pub name: String,
}

/// The sketch aggregate: the live face graph and guide lines.
///
/// `P` is the caller's region payload (material, room tag, ...). It is
/// carried from face to face across rebuilds and never inspected.
///
/// # Example
///
/// ```
/// use floorsketch_topology::{BuilderRegion, Sketch};
/// use nalgebra::Point2;
///
/// let mut sketch: Sketch = Sketch::new();
/// let rect = BuilderRegion::polygon(
///     "A",
///     &[
///         Point2::new(0.0, 0.0),
///         Point2::new(4.0, 0.0),
///         Point2::new(4.0, 3.0),
///         Point2::new(0.0, 3.0),
///     ],
/// );
/// sketch.create_builder().add_regions(vec![rect]).unwrap();
///
/// assert_eq!(sketch.face_count(), 1);
/// assert_eq!(sketch.point_count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Sketch<P = ()> {
    // Entity storage
    pub(crate) points: SlotMap<PointKey, PointData>,
    pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
    pub(crate) coedges: SlotMap<CoedgeKey, CoedgeData>,
    pub(crate) wires: SlotMap<WireKey, WireData>,
    pub(crate) faces: SlotMap<FaceKey, FaceData<P>>,
    pub(crate) guide_lines: SlotMap<GuideLineKey, GuideLineData>,

    // Upward adjacency: point → edges using it
    pub(crate) point_to_edges: FxHashMap<PointKey, FxHashSet<EdgeKey>>,

    pub(crate) background: Option<BuilderRegion>,
    pub(crate) names: NameAllocator,
}

impl<P> Sketch<P> {
    /// Creates a new, empty sketch.
    pub fn new() -> Self {
        Self {
            points: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            coedges: SlotMap::with_key(),
            wires: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            guide_lines: SlotMap::with_key(),
            point_to_edges: FxHashMap::default(),
            background: None,
            names: NameAllocator::default(),
        }
    }

    /// An empty graph that keeps this sketch's guide lines, background and
    /// name counters. Starting point of every rebuild.
    pub(crate) fn next_generation(&self, names: NameAllocator) -> Self {
        Self {
            guide_lines: self.guide_lines.clone(),
            background: self.background.clone(),
            names,
            ..Self::new()
        }
    }

    // --- Point operations ---

    pub fn point(&self, key: PointKey) -> Option<&PointData> {
        self.points.get(key)
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> impl Iterator<Item = (PointKey, &PointData)> {
        self.points.iter()
    }

    // --- Edge operations ---

    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeData> {
        self.edges.get(key)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &EdgeData)> {
        self.edges.iter()
    }

    /// Finds a live edge by its topology name.
    pub fn edge_by_name(&self, name: &str) -> Option<EdgeKey> {
        self.edges
            .iter()
            .find(|(_, e)| e.name == name)
            .map(|(k, _)| k)
    }

    // --- Coedge operations ---

    pub fn coedge(&self, key: CoedgeKey) -> Option<&CoedgeData> {
        self.coedges.get(key)
    }

    pub fn coedge_count(&self) -> usize {
        self.coedges.len()
    }

    // --- Wire operations ---

    pub fn wire(&self, key: WireKey) -> Option<&WireData> {
        self.wires.get(key)
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    // --- Face operations ---

    pub fn face(&self, key: FaceKey) -> Option<&FaceData<P>> {
        self.faces.get(key)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &FaceData<P>)> {
        self.faces.iter()
    }

    /// Finds a live face by its topology name.
    pub fn face_by_name(&self, name: &str) -> Option<FaceKey> {
        self.faces
            .iter()
            .find(|(_, f)| f.name == name)
            .map(|(k, _)| k)
    }

    /// Returns the payload attached to a face.
    pub fn payload(&self, face: FaceKey) -> Option<&P> {
        self.faces.get(face).and_then(|f| f.payload.as_ref())
    }

    /// Attaches a payload to a face, returning the previous one.
    ///
    /// This is how callers tag freshly created faces; the payload then
    /// follows the face through later rebuilds.
    pub fn set_payload(&mut self, face: FaceKey, payload: P) -> Result<Option<P>> {
        let data = self.faces.get_mut(face).ok_or(Error::FaceNotFound(face))?;
        Ok(data.payload.replace(payload))
    }

    // --- Guide lines ---

    pub fn guide_line(&self, key: GuideLineKey) -> Option<&GuideLineData> {
        self.guide_lines.get(key)
    }

    pub fn guide_line_count(&self) -> usize {
        self.guide_lines.len()
    }

    pub fn guide_lines(&self) -> impl Iterator<Item = (GuideLineKey, &GuideLineData)> {
        self.guide_lines.iter()
    }

    // --- Background ---

    /// The stored background region, if any.
    pub fn background(&self) -> Option<&BuilderRegion> {
        self.background.as_ref()
    }

    // --- Entity existence checks ---

    /// Returns `true` if the given topology key references a live entity.
    pub fn contains(&self, key: TopologyKey) -> bool {
        match key {
            TopologyKey::Point(k) => self.points.contains_key(k),
            TopologyKey::Edge(k) => self.edges.contains_key(k),
            TopologyKey::Coedge(k) => self.coedges.contains_key(k),
            TopologyKey::Wire(k) => self.wires.contains_key(k),
            TopologyKey::Face(k) => self.faces.contains_key(k),
            TopologyKey::GuideLine(k) => self.guide_lines.contains_key(k),
        }
    }

    /// `true` when the sketch has no faces.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    // --- Adjacency index helpers ---

    /// Register that an edge uses a point (upward adjacency).
    pub(crate) fn link_point_edge(&mut self, point: PointKey, edge: EdgeKey) {
        self.point_to_edges.entry(point).or_default().insert(edge);
    }
}

impl<P> Default for Sketch<P> {
    fn default() -> Self {
        Self::new()
    }
}
