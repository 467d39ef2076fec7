// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pre-build flattening: live sketch plus pending edits → boolean input.
//!
//! The flattener decides which curves the boolean engine sees and which
//! areas must come out filled:
//!
//! - every retained edge of the live sketch (edges first, in arena order, so
//!   existing points seed the point encoder and win deduplication);
//! - every curve of every new region, path and face copy;
//! - one *fill source* per retained face (or group of faces being merged),
//!   per new region, per closed path and per copy.
//!
//! All input validation happens here, before the engine is called, so a
//! rejected batch never touches the sketch.

use nalgebra::{Point2, Vector2};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::Sketch;
use crate::boolean::PointInEdge;
use crate::curve::{intersections, Curve2d};
use crate::error::{Error, Result};
use crate::geometry::{loop_signed_area, tessellate_loop, Contour};
use crate::keys::*;
use crate::naming::NameAllocator;
use crate::region::{BuilderCurve, BuilderRegion};
use crate::spatial::PointEncoder;

/// One batch of boundary edits, applied by a single rebuild.
#[derive(Debug, Clone, Default)]
pub struct EditBatch {
    pub regions: Vec<BuilderRegion>,
    /// Chains of curves. Closed chains add a face; open chains only split.
    pub paths: Vec<Vec<BuilderCurve>>,
    pub remove_edges: Vec<EdgeKey>,
    pub remove_faces: Vec<FaceKey>,
    /// Each group of faces becomes one face.
    pub merge_groups: Vec<Vec<FaceKey>>,
    /// Points at which an edge is cut in two.
    pub split_points: Vec<(Point2<f64>, EdgeKey)>,
    /// Faces to duplicate, moved by an offset.
    pub copies: Vec<(FaceKey, Vector2<f64>)>,
}

impl EditBatch {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
            && self.paths.is_empty()
            && self.remove_edges.is_empty()
            && self.remove_faces.is_empty()
            && self.merge_groups.is_empty()
            && self.split_points.is_empty()
            && self.copies.is_empty()
    }
}

/// Something a rebuilt face may inherit from.
#[derive(Debug, Clone)]
pub struct Contributor {
    pub name: String,
    /// Prior face this contributor is.
    pub face: Option<FaceKey>,
    /// Prior face whose payload a face built from this contributor gets.
    pub payload_from: Option<FaceKey>,
    /// Comes from this batch's input rather than the live sketch.
    pub new_input: bool,
    /// Even-odd contours of the contributor's area.
    pub loops: Vec<Contour>,
}

/// An area that must be covered by faces after the rebuild.
#[derive(Debug, Clone, Default)]
pub struct FillSource {
    pub contributors: Vec<Contributor>,
    /// Set for face copies: the face being copied.
    pub copy_of: Option<FaceKey>,
}

/// Output of [`flatten`]: the engine input plus everything reconciliation
/// needs to map the result back.
#[derive(Debug)]
pub struct Flattened {
    /// The boolean input (`ptInEdges`).
    pub edges: Vec<PointInEdge>,
    /// Live edge each input curve came from, if any.
    pub origins: Vec<Option<EdgeKey>>,
    pub sources: Vec<FillSource>,
    /// Canonical points of this run (`encodedPointMp`).
    pub points: PointEncoder,
    /// Prior faces by name (`oldfaceMap`).
    pub old_faces: FxHashMap<String, FaceKey>,
}

/// Flattens `sketch` plus `batch` into boolean input.
///
/// Fresh names for unnamed input come from `names`; the caller commits the
/// allocator only if the whole rebuild succeeds.
pub fn flatten<P>(
    sketch: &Sketch<P>,
    batch: &EditBatch,
    names: &mut NameAllocator,
    tolerance: f64,
    arc_segments: usize,
) -> Result<Flattened> {
    check_keys(sketch, batch)?;
    for region in &batch.regions {
        check_region(region, tolerance)?;
    }
    for path in &batch.paths {
        for c in path {
            check_curve(c, "path", tolerance)?;
        }
    }

    let mut out = Flattened {
        edges: Vec::new(),
        origins: Vec::new(),
        sources: Vec::new(),
        points: PointEncoder::new(tolerance),
        old_faces: sketch
            .faces
            .iter()
            .map(|(fk, f)| (f.name.clone(), fk))
            .collect(),
    };

    let taken: FxHashSet<String> = sketch
        .faces
        .values()
        .map(|f| f.name.clone())
        .chain(sketch.edges.values().map(|e| e.name.clone()))
        .chain(batch.regions.iter().map(|r| r.topology_id.clone()))
        .chain(
            batch
                .regions
                .iter()
                .flat_map(|r| r.curves())
                .chain(batch.paths.iter().flatten())
                .map(|c| c.topology_id.clone()),
        )
        .filter(|n| !n.is_empty())
        .collect();
    let is_taken = |n: &str| taken.contains(n);

    // --- Prior faces: merge groups and removals ---

    let face_source = prior_fill_sources(sketch, batch, &mut out, arc_segments);

    // --- Prior edges ---

    let removed_edges: FxHashSet<EdgeKey> = batch.remove_edges.iter().copied().collect();
    let mut splits: FxHashMap<EdgeKey, Vec<Point2<f64>>> = FxHashMap::default();
    for &(p, ek) in &batch.split_points {
        splits.entry(ek).or_default().push(p);
    }

    for (ek, edge) in &sketch.edges {
        if removed_edges.contains(&ek) {
            continue;
        }
        let sides: Vec<(FaceKey, Option<usize>)> = edge
            .coedges
            .iter()
            .filter_map(|&ck| sketch.find_face_by_coedge(ck))
            .map(|fk| (fk, face_source.get(&fk).copied()))
            .collect();
        if !sides.is_empty() && sides.iter().all(|(_, s)| s.is_none()) {
            continue;
        }
        if let [(fa, Some(sa)), (fb, Some(sb))] = sides[..] {
            if fa != fb && sa == sb {
                continue;
            }
        }

        let mut regions: Vec<usize> = Vec::new();
        for s in sides.iter().filter_map(|(_, s)| *s) {
            if let Some(pos) = regions.iter().position(|&r| r == s) {
                regions.remove(pos);
            } else {
                regions.push(s);
            }
        }

        let curve = edge.curve.with_endpoints(
            sketch.points[edge.start].position,
            sketch.points[edge.end].position,
        );
        let pieces = match splits.get(&ek) {
            Some(points) => split_curve(&curve, points, tolerance),
            None => vec![curve],
        };
        for piece in pieces {
            out.push(piece, edge.name.clone(), regions.clone(), Some(ek));
        }
    }

    // --- Face copies ---

    for &(fk, offset) in &batch.copies {
        let Some(region) = sketch.builder_region(fk) else {
            return Err(Error::FaceNotFound(fk));
        };
        let moved = region.translated(&offset);
        let name = names.fresh_face(is_taken);
        let s = out.sources.len();
        out.sources.push(FillSource {
            contributors: vec![Contributor {
                name,
                face: None,
                payload_from: Some(fk),
                new_input: true,
                loops: region_contours(&moved, arc_segments),
            }],
            copy_of: Some(fk),
        });
        for c in moved.curves() {
            let edge_name = names.fresh_edge(is_taken);
            out.push(c.curve, edge_name, vec![s], None);
        }
    }

    // --- New regions ---

    for region in &batch.regions {
        let name = non_empty_or(&region.topology_id, || names.fresh_face(is_taken));
        let s = out.sources.len();
        out.sources.push(FillSource {
            contributors: vec![Contributor {
                name,
                face: None,
                payload_from: None,
                new_input: true,
                loops: region_contours(region, arc_segments),
            }],
            copy_of: None,
        });
        for c in region.curves() {
            let edge_name = non_empty_or(&c.topology_id, || names.fresh_edge(is_taken));
            out.push(c.curve, edge_name, vec![s], None);
        }
    }

    // --- Paths ---

    for path in &batch.paths {
        let curves: Vec<Curve2d> = path.iter().map(|c| c.curve).collect();
        let regions = if is_closed_chain(&curves, tolerance) {
            let s = out.sources.len();
            out.sources.push(FillSource {
                contributors: vec![Contributor {
                    name: names.fresh_face(is_taken),
                    face: None,
                    payload_from: None,
                    new_input: true,
                    loops: vec![tessellate_loop(&curves, arc_segments)],
                }],
                copy_of: None,
            });
            vec![s]
        } else {
            Vec::new()
        };
        for c in path {
            let edge_name = non_empty_or(&c.topology_id, || names.fresh_edge(is_taken));
            out.push(c.curve, edge_name, regions.clone(), None);
        }
    }

    out.snap_endpoints(tolerance);
    Ok(out)
}

impl Flattened {
    fn push(
        &mut self,
        curve: Curve2d,
        topology_id: String,
        regions: Vec<usize>,
        origin: Option<EdgeKey>,
    ) {
        self.edges.push(PointInEdge {
            curve,
            topology_id,
            regions,
        });
        self.origins.push(origin);
    }

    /// Encodes every end point and moves curve ends onto canonical points.
    /// Curves that collapse onto a single point are dropped.
    fn snap_endpoints(&mut self, tolerance: f64) {
        let mut keep = Vec::with_capacity(self.edges.len());
        for e in &mut self.edges {
            let a = self.points.encode(e.curve.start());
            let b = self.points.encode(e.curve.end());
            if a == b && e.curve.length() <= 2.0 * tolerance {
                keep.push(false);
                continue;
            }
            e.curve = e
                .curve
                .with_endpoints(self.points.position(a), self.points.position(b));
            keep.push(true);
        }
        let mut k = keep.iter();
        self.edges.retain(|_| k.next().copied().unwrap_or(false));
        let mut k = keep.iter();
        self.origins.retain(|_| k.next().copied().unwrap_or(false));
    }
}

/// Groups retained prior faces into fill sources. Returns the source index
/// of every retained face.
fn prior_fill_sources<P>(
    sketch: &Sketch<P>,
    batch: &EditBatch,
    out: &mut Flattened,
    arc_segments: usize,
) -> FxHashMap<FaceKey, usize> {
    let keys: Vec<FaceKey> = sketch.faces.keys().collect();
    let index: FxHashMap<FaceKey, usize> = keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
    let mut groups = UnionFind::new(keys.len());
    let mut removed = vec![false; keys.len()];

    for group in &batch.merge_groups {
        for pair in group.windows(2) {
            groups.union(index[&pair[0]], index[&pair[1]]);
        }
    }
    for &fk in &batch.remove_faces {
        removed[index[&fk]] = true;
    }
    for &ek in &batch.remove_edges {
        let faces = sketch.edge_faces(ek).unwrap_or_default();
        match faces[..] {
            [fa, fb] => groups.union(index[&fa], index[&fb]),
            [fa] if sketch.edges[ek].coedges.len() == 1 => removed[index[&fa]] = true,
            _ => {}
        }
    }

    // A group goes away as a whole when any member is removed
    let mut group_removed = vec![false; keys.len()];
    for i in 0..keys.len() {
        if removed[i] {
            group_removed[groups.find(i)] = true;
        }
    }

    let mut root_source: FxHashMap<usize, usize> = FxHashMap::default();
    let mut face_source = FxHashMap::default();
    for (i, &fk) in keys.iter().enumerate() {
        let root = groups.find(i);
        if group_removed[root] {
            continue;
        }
        let s = *root_source.entry(root).or_insert_with(|| {
            out.sources.push(FillSource::default());
            out.sources.len() - 1
        });
        let face = &sketch.faces[fk];
        out.sources[s].contributors.push(Contributor {
            name: face.name.clone(),
            face: Some(fk),
            payload_from: Some(fk),
            new_input: false,
            loops: sketch.face_contours(fk, arc_segments).unwrap_or_default(),
        });
        face_source.insert(fk, s);
    }
    face_source
}

fn check_keys<P>(sketch: &Sketch<P>, batch: &EditBatch) -> Result<()> {
    let face = |fk: FaceKey| {
        if sketch.faces.contains_key(fk) {
            Ok(())
        } else {
            Err(Error::FaceNotFound(fk))
        }
    };
    let edge = |ek: EdgeKey| {
        if sketch.edges.contains_key(ek) {
            Ok(())
        } else {
            Err(Error::EdgeNotFound(ek))
        }
    };
    batch.remove_edges.iter().try_for_each(|&ek| edge(ek))?;
    batch.split_points.iter().try_for_each(|&(_, ek)| edge(ek))?;
    batch.remove_faces.iter().try_for_each(|&fk| face(fk))?;
    batch.merge_groups.iter().flatten().try_for_each(|&fk| face(fk))?;
    batch.copies.iter().try_for_each(|&(fk, _)| face(fk))?;
    Ok(())
}

fn check_curve(c: &BuilderCurve, owner: &str, tolerance: f64) -> Result<()> {
    let length = c.curve.length();
    if !length.is_finite() || length < tolerance {
        let id = if c.topology_id.is_empty() {
            owner.to_string()
        } else {
            c.topology_id.clone()
        };
        return Err(Error::DegenerateCurve { id, length });
    }
    Ok(())
}

/// Rejects degenerate curves, open loops and loops whose curves cross.
fn check_region(region: &BuilderRegion, tolerance: f64) -> Result<()> {
    let name = if region.topology_id.is_empty() {
        "<unnamed>"
    } else {
        region.topology_id.as_str()
    };
    for lp in region.loops() {
        if lp.is_empty() {
            return Err(Error::EmptyWire);
        }
        for c in lp {
            check_curve(c, name, tolerance)?;
        }
        let n = lp.len();
        for i in 0..n {
            let j = (i + 1) % n;
            if (lp[i].curve.end() - lp[j].curve.start()).norm() > tolerance {
                return Err(Error::OpenLoop(name.to_string(), i, j));
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let mut joints = Vec::with_capacity(2);
                if j == i + 1 {
                    joints.push(lp[i].curve.end());
                }
                if i == 0 && j == n - 1 {
                    joints.push(lp[0].curve.start());
                }
                let crossing = intersections(&lp[i].curve, &lp[j].curve, tolerance)
                    .into_iter()
                    .any(|x| joints.iter().all(|q| (x - q).norm() > tolerance));
                if crossing {
                    return Err(Error::SelfIntersectingLoop(name.to_string(), i, j));
                }
            }
        }
    }
    Ok(())
}

/// `true` for a connected chain that returns to its start and encloses area.
fn is_closed_chain(curves: &[Curve2d], tolerance: f64) -> bool {
    let (Some(first), Some(last)) = (curves.first(), curves.last()) else {
        return false;
    };
    let connected = curves
        .windows(2)
        .all(|w| (w[0].end() - w[1].start()).norm() <= tolerance);
    let perimeter: f64 = curves.iter().map(Curve2d::length).sum();
    connected
        && (last.end() - first.start()).norm() <= tolerance
        && loop_signed_area(curves).abs() > tolerance * perimeter
}

/// Cuts `curve` at the projections of `points`, ignoring cuts within
/// tolerance of an end or of each other.
fn split_curve(curve: &Curve2d, points: &[Point2<f64>], tolerance: f64) -> Vec<Curve2d> {
    let length = curve.length();
    let min_step = if length > 0.0 { tolerance / length } else { 1.0 };
    let mut params: Vec<f64> = points
        .iter()
        .map(|p| curve.param_at(p).clamp(0.0, 1.0))
        .filter(|&t| t > min_step && t < 1.0 - min_step)
        .collect();
    params.sort_by(f64::total_cmp);
    params.dedup_by(|b, a| *b - *a <= min_step);

    let mut pieces = Vec::with_capacity(params.len() + 1);
    let mut t0 = 0.0;
    for t in params.into_iter().chain(std::iter::once(1.0)) {
        pieces.push(curve.sub(t0, t));
        t0 = t;
    }
    pieces
}

fn region_contours(region: &BuilderRegion, arc_segments: usize) -> Vec<Contour> {
    region
        .loops()
        .map(|lp| {
            let curves: Vec<Curve2d> = lp.iter().map(|c| c.curve).collect();
            tessellate_loop(&curves, arc_segments)
        })
        .collect()
}

fn non_empty_or(name: &str, fresh: impl FnOnce() -> String) -> String {
    if name.is_empty() {
        fresh()
    } else {
        name.to_string()
    }
}

/// Disjoint sets over face indices.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index stays root so groups keep arena order
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    fn rect(name: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> BuilderRegion {
        BuilderRegion::polygon(name, &[p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1)])
    }

    fn flatten_batch(sketch: &Sketch, batch: &EditBatch) -> Result<Flattened> {
        let mut names = sketch.names.clone();
        flatten(sketch, batch, &mut names, TOL, 128)
    }

    fn two_rooms() -> Sketch {
        let mut sketch: Sketch = Sketch::new();
        sketch
            .create_builder()
            .add_regions(vec![
                rect("A", 0.0, 0.0, 4.0, 3.0),
                rect("B", 4.0, 0.0, 8.0, 3.0),
            ])
            .unwrap();
        sketch
    }

    #[test]
    fn new_region_becomes_fill_source() {
        let sketch: Sketch = Sketch::new();
        let batch = EditBatch {
            regions: vec![rect("A", 0.0, 0.0, 4.0, 3.0)],
            ..Default::default()
        };
        let flat = flatten_batch(&sketch, &batch).unwrap();
        assert_eq!(flat.edges.len(), 4);
        assert_eq!(flat.sources.len(), 1);
        assert_eq!(flat.sources[0].contributors[0].name, "A");
        assert!(flat.edges.iter().all(|e| e.regions == vec![0]));
        assert!(flat.edges.iter().all(|e| e.topology_id.starts_with("edge-")));
        assert_eq!(flat.points.len(), 4);
    }

    #[test]
    fn degenerate_curve_is_rejected() {
        let sketch: Sketch = Sketch::new();
        let mut region = rect("A", 0.0, 0.0, 4.0, 3.0);
        region.outer.insert(
            1,
            BuilderCurve::new(Curve2d::line(p(4.0, 0.0), p(4.0, 1e-8)), "tiny"),
        );
        let batch = EditBatch {
            regions: vec![region],
            ..Default::default()
        };
        assert!(matches!(
            flatten_batch(&sketch, &batch),
            Err(Error::DegenerateCurve { ref id, .. }) if id == "tiny"
        ));
    }

    #[test]
    fn bow_tie_is_rejected() {
        let sketch: Sketch = Sketch::new();
        let bow = BuilderRegion::polygon(
            "X",
            &[p(0.0, 0.0), p(2.0, 2.0), p(2.0, 0.0), p(0.0, 2.0)],
        );
        let batch = EditBatch {
            regions: vec![bow],
            ..Default::default()
        };
        assert!(matches!(
            flatten_batch(&sketch, &batch),
            Err(Error::SelfIntersectingLoop(_, 0, 2))
        ));
    }

    #[test]
    fn open_loop_is_rejected() {
        let sketch: Sketch = Sketch::new();
        let mut region = rect("A", 0.0, 0.0, 4.0, 3.0);
        region.outer.pop();
        let batch = EditBatch {
            regions: vec![region],
            ..Default::default()
        };
        assert!(matches!(
            flatten_batch(&sketch, &batch),
            Err(Error::OpenLoop(_, 2, 0))
        ));
    }

    #[test]
    fn shared_edge_carries_both_faces() {
        let sketch = two_rooms();
        let flat = flatten_batch(&sketch, &EditBatch::default()).unwrap();
        assert_eq!(flat.edges.len(), 7);
        assert_eq!(flat.sources.len(), 2);
        assert_eq!(flat.edges.iter().filter(|e| e.regions.len() == 2).count(), 1);
        assert!(flat.origins.iter().all(Option::is_some));
    }

    #[test]
    fn merge_drops_interior_edge() {
        let sketch = two_rooms();
        let fa = sketch.face_by_name("A").unwrap();
        let fb = sketch.face_by_name("B").unwrap();
        let batch = EditBatch {
            merge_groups: vec![vec![fa, fb]],
            ..Default::default()
        };
        let flat = flatten_batch(&sketch, &batch).unwrap();
        assert_eq!(flat.edges.len(), 6);
        assert_eq!(flat.sources.len(), 1);
        assert_eq!(flat.sources[0].contributors.len(), 2);
    }

    #[test]
    fn removing_shared_edge_merges() {
        let sketch = two_rooms();
        let shared = sketch
            .edges()
            .find(|(_, e)| e.coedges.len() == 2)
            .map(|(k, _)| k)
            .unwrap();
        let batch = EditBatch {
            remove_edges: vec![shared],
            ..Default::default()
        };
        let flat = flatten_batch(&sketch, &batch).unwrap();
        assert_eq!(flat.sources.len(), 1);
        assert_eq!(flat.edges.len(), 6);
    }

    #[test]
    fn removing_face_keeps_shared_edge_for_neighbour() {
        let sketch = two_rooms();
        let fb = sketch.face_by_name("B").unwrap();
        let batch = EditBatch {
            remove_faces: vec![fb],
            ..Default::default()
        };
        let flat = flatten_batch(&sketch, &batch).unwrap();
        assert_eq!(flat.sources.len(), 1);
        assert_eq!(flat.edges.len(), 4);
        assert!(flat.edges.iter().all(|e| e.regions == vec![0]));
    }

    #[test]
    fn split_point_cuts_edge_in_two() {
        let sketch = two_rooms();
        let bottom = sketch
            .edges()
            .find(|(_, e)| e.curve.midpoint() == p(2.0, 0.0))
            .map(|(k, _)| k)
            .unwrap();
        let name = sketch.edge(bottom).unwrap().name.clone();
        let batch = EditBatch {
            split_points: vec![(p(1.0, 0.2), bottom)],
            ..Default::default()
        };
        let flat = flatten_batch(&sketch, &batch).unwrap();
        let pieces: Vec<&PointInEdge> = flat
            .edges
            .iter()
            .filter(|e| e.topology_id == name)
            .collect();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].curve.end(), p(1.0, 0.0));
    }

    #[test]
    fn closed_path_fills_open_path_splits() {
        let sketch: Sketch = Sketch::new();
        let tri = [p(0.0, 0.0), p(3.0, 0.0), p(0.0, 3.0)];
        let closed: Vec<BuilderCurve> = (0..3)
            .map(|i| BuilderCurve::anonymous(Curve2d::line(tri[i], tri[(i + 1) % 3])))
            .collect();
        let open = vec![BuilderCurve::anonymous(Curve2d::line(p(-1.0, 1.0), p(4.0, 1.0)))];
        let batch = EditBatch {
            paths: vec![closed, open],
            ..Default::default()
        };
        let flat = flatten_batch(&sketch, &batch).unwrap();
        assert_eq!(flat.sources.len(), 1);
        assert!(flat.edges[3].regions.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let sketch = two_rooms();
        let fa = sketch.face_by_name("A").unwrap();
        let empty: Sketch = Sketch::new();
        let batch = EditBatch {
            remove_faces: vec![fa],
            ..Default::default()
        };
        assert!(matches!(
            flatten_batch(&empty, &batch),
            Err(Error::FaceNotFound(_))
        ));
    }
}
