// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Materialization of a reconciled boolean result as the next sketch
//! generation.
//!
//! Points come straight from the point encoder, one per canonical id in use,
//! so coincident end points are a single point by construction. Edges are
//! built once per engine piece and every region loop is threaded through
//! [`Sketch::add_wire`], which links partners as the second coedge of an
//! edge arrives. The new generation is validated before it is returned.

use rustc_hash::FxHashMap;

use crate::arena::Sketch;
use crate::boolean::{BoolCoedge, BoolResult};
use crate::error::{Error, Result};
use crate::flatten::Flattened;
use crate::keys::*;
use crate::naming::NameAllocator;
use crate::reconcile::{EdgeName, Reconciled};
use crate::spatial::CanonicalId;

/// What a rebuild changed, keyed the way callers reference topology.
///
/// Old → new maps match entities by name: a face or edge that kept its name
/// maps to its successor, a coedge maps when its edge kept its name and it
/// still starts at the same point. [`face_lineage`](Self::face_lineage)
/// follows area instead of names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Faces whose name did not exist before, in creation order.
    pub added_faces: Vec<String>,
    /// Prior faces whose name is gone.
    pub removed_faces: Vec<String>,
    /// `(source face, copy)` names for every copied face.
    pub copied_faces: Vec<(String, String)>,
    pub face_map: FxHashMap<FaceKey, FaceKey>,
    /// Prior face → every new face it shares area with, in build order. A
    /// split face lists all of its pieces.
    pub face_lineage: FxHashMap<FaceKey, Vec<FaceKey>>,
    pub edge_map: FxHashMap<EdgeKey, EdgeKey>,
    pub coedge_map: FxHashMap<CoedgeKey, CoedgeKey>,
}

/// Builds the next generation of `prior` from a reconciled result.
pub fn synchronize<P: Clone>(
    prior: &Sketch<P>,
    flat: &Flattened,
    result: &BoolResult,
    reconciled: Reconciled,
    names: NameAllocator,
    tolerance: f64,
) -> Result<(Sketch<P>, BuildReport)> {
    let Reconciled {
        regions,
        edge_ends,
        mut edge_names,
        prior_face_regions,
        copies,
        ..
    } = reconciled;
    let mut sketch = prior.next_generation(names);

    // --- Points and edges ---

    let mut point_keys: FxHashMap<CanonicalId, PointKey> = FxHashMap::default();
    let mut edge_keys: FxHashMap<usize, EdgeKey> = FxHashMap::default();
    let mut used: Vec<usize> = edge_names.keys().copied().collect();
    used.sort_unstable();

    for k in used {
        let Some(EdgeName { name, sources }) = edge_names.remove(&k) else {
            continue;
        };
        let (a, b) = edge_ends[k];
        let start = flat.points.position(a);
        let end = flat.points.position(b);
        let pa = *point_keys.entry(a).or_insert_with(|| sketch.add_point(start));
        let pb = *point_keys.entry(b).or_insert_with(|| sketch.add_point(end));
        let curve = result.edges[k].curve.with_endpoints(start, end);
        edge_keys.insert(k, sketch.add_edge(pa, pb, curve, name, sources)?);
    }

    // --- Wires and faces ---

    let ring = |lp: &[BoolCoedge]| -> Result<Vec<(EdgeKey, bool)>> {
        lp.iter()
            .map(|c| {
                edge_keys
                    .get(&c.edge)
                    .map(|&ek| (ek, c.reversed))
                    .ok_or_else(|| {
                        Error::InvariantViolation(format!("engine edge {} was never built", c.edge))
                    })
            })
            .collect()
    };

    let mut region_faces = Vec::with_capacity(regions.len());
    for region in regions {
        let outer = sketch.add_wire(&ring(&region.outer)?)?;
        let holes = region
            .holes
            .iter()
            .map(|h| sketch.add_wire(&ring(h)?))
            .collect::<Result<Vec<_>>>()?;
        let payload = region
            .payload_from
            .and_then(|fk| prior.payload(fk).cloned());
        region_faces.push(sketch.add_face(outer, holes, region.name, region.sources, payload)?);
    }

    sketch.validate(tolerance)?;

    // --- Report ---

    let canonical_of: FxHashMap<PointKey, CanonicalId> =
        point_keys.iter().map(|(&id, &pk)| (pk, id)).collect();
    let mut report = build_report(prior, &sketch, flat, &canonical_of, &copies, &region_faces);
    report.face_lineage = prior_face_regions
        .into_iter()
        .map(|(fk, rs)| (fk, rs.iter().filter_map(|&r| region_faces.get(r).copied()).collect()))
        .collect();

    tracing::debug!(
        points = sketch.point_count(),
        edges = sketch.edge_count(),
        faces = sketch.face_count(),
        added = report.added_faces.len(),
        removed = report.removed_faces.len(),
        "Synchronized sketch generation"
    );
    Ok((sketch, report))
}

fn build_report<P>(
    prior: &Sketch<P>,
    sketch: &Sketch<P>,
    flat: &Flattened,
    canonical_of: &FxHashMap<PointKey, CanonicalId>,
    copies: &[(FaceKey, usize)],
    region_faces: &[FaceKey],
) -> BuildReport {
    let mut report = BuildReport::default();

    let new_faces: FxHashMap<&str, FaceKey> =
        sketch.faces.iter().map(|(k, f)| (f.name.as_str(), k)).collect();
    let old_faces: FxHashMap<&str, FaceKey> =
        prior.faces.iter().map(|(k, f)| (f.name.as_str(), k)).collect();
    for (ok, face) in &prior.faces {
        match new_faces.get(face.name.as_str()) {
            Some(&nk) => {
                report.face_map.insert(ok, nk);
            }
            None => report.removed_faces.push(face.name.clone()),
        }
    }
    report.added_faces = sketch
        .faces
        .values()
        .filter(|f| !old_faces.contains_key(f.name.as_str()))
        .map(|f| f.name.clone())
        .collect();
    report.copied_faces = copies
        .iter()
        .filter_map(|&(source, r)| {
            let from = prior.faces.get(source)?.name.clone();
            let to = sketch.faces.get(*region_faces.get(r)?)?.name.clone();
            Some((from, to))
        })
        .collect();

    let new_edges: FxHashMap<&str, EdgeKey> =
        sketch.edges.iter().map(|(k, e)| (e.name.as_str(), k)).collect();
    for (ok, edge) in &prior.edges {
        if let Some(&nk) = new_edges.get(edge.name.as_str()) {
            report.edge_map.insert(ok, nk);
        }
    }

    // A coedge is identified by its edge's name and its start point
    let new_coedges: FxHashMap<(&str, CanonicalId), CoedgeKey> = sketch
        .coedges
        .keys()
        .filter_map(|ck| {
            let edge = &sketch.edges.get(sketch.coedges.get(ck)?.edge)?.name;
            let start = canonical_of.get(&sketch.coedge_start(ck)?)?;
            Some(((edge.as_str(), *start), ck))
        })
        .collect();
    for ck in prior.coedges.keys() {
        let mapped = prior_coedge_identity(prior, flat, ck).and_then(|id| new_coedges.get(&id));
        if let Some(&nk) = mapped {
            report.coedge_map.insert(ck, nk);
        }
    }

    report
}

fn prior_coedge_identity<'a, P>(
    prior: &'a Sketch<P>,
    flat: &Flattened,
    ck: CoedgeKey,
) -> Option<(&'a str, CanonicalId)> {
    let edge = prior.edges.get(prior.coedges.get(ck)?.edge)?;
    let start = prior.points.get(prior.coedge_start(ck)?)?.position;
    Some((edge.name.as_str(), flat.points.find(&start)?))
}
