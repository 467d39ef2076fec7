// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boolean reconciliation: map engine regions back onto prior topology.
//!
//! For every filled region this measures how much area it shares with each
//! contributor of its fill sources (prior faces, new regions, copies) and
//! turns those overlaps into names, source lists and payload links. Edge
//! pieces are named the same way using the length they share with the
//! input curves they lie on, after exact matches with prior edges have
//! reclaimed their names.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::Sketch;
use crate::boolean::{BoolCoedge, BoolResult};
use crate::curve::Curve2d;
use crate::error::{Error, Result};
use crate::flatten::Flattened;
use crate::geometry::{intersection_area, tessellate_loop, Contour};
use crate::keys::*;
use crate::naming::{resolve_claims, Claim, NameAllocator};
use crate::spatial::CanonicalId;

/// A region that will become a face.
#[derive(Debug, Clone)]
pub struct ReconciledRegion {
    pub outer: Vec<BoolCoedge>,
    pub holes: Vec<Vec<BoolCoedge>>,
    pub name: String,
    /// Contributor names, strongest overlap first.
    pub sources: Vec<String>,
    /// Prior face whose payload the new face carries.
    pub payload_from: Option<FaceKey>,
}

/// Name and lineage of one engine edge.
#[derive(Debug, Clone)]
pub struct EdgeName {
    pub name: String,
    pub sources: Vec<String>,
}

/// Everything the synchronizer needs to build the next generation.
#[derive(Debug)]
pub struct Reconciled {
    pub regions: Vec<ReconciledRegion>,
    /// Canonical end points of every engine edge.
    pub edge_ends: Vec<(CanonicalId, CanonicalId)>,
    /// Names of the engine edges used by some region.
    pub edge_names: FxHashMap<usize, EdgeName>,
    /// Engine edges that collapse to a point (`ptCoedgeSet`).
    pub point_coedges: FxHashSet<usize>,
    /// Prior face → regions it contributed area to (`oldFace2Regions`).
    pub prior_face_regions: FxHashMap<FaceKey, Vec<usize>>,
    /// Copied face → region holding the copy.
    pub copies: Vec<(FaceKey, usize)>,
}

/// Reconciles `result` against the flattened input.
pub fn reconcile<P>(
    sketch: &Sketch<P>,
    flat: &mut Flattened,
    result: &BoolResult,
    names: &mut NameAllocator,
    tolerance: f64,
    arc_segments: usize,
) -> Result<Reconciled> {
    result
        .check(flat.edges.len())
        .map_err(Error::InvalidBooleanResult)?;

    // --- Canonical end points and point coedges ---

    let edge_ends: Vec<(CanonicalId, CanonicalId)> = result
        .edges
        .iter()
        .map(|e| (flat.points.encode(e.curve.start()), flat.points.encode(e.curve.end())))
        .collect();
    let point_coedges: FxHashSet<usize> = result
        .edges
        .iter()
        .enumerate()
        .filter(|&(k, e)| edge_ends[k].0 == edge_ends[k].1 || e.curve.length() < tolerance)
        .map(|(k, _)| k)
        .collect();

    // --- Filled regions, without point coedges ---

    struct Candidate {
        outer: Vec<BoolCoedge>,
        holes: Vec<Vec<BoolCoedge>>,
        fills: Vec<usize>,
    }
    let strip = |lp: &[BoolCoedge]| -> Option<Vec<BoolCoedge>> {
        let kept: Vec<BoolCoedge> = lp
            .iter()
            .filter(|c| !point_coedges.contains(&c.edge))
            .copied()
            .collect();
        (kept.len() >= 2).then_some(kept)
    };
    let mut candidates = Vec::new();
    for (r, region) in result.regions.iter().enumerate() {
        if region.fills.is_empty() {
            continue;
        }
        let Some(outer) = strip(&region.outer) else {
            tracing::warn!(region = r, "Dropping region whose outer loop collapses to a point");
            continue;
        };
        candidates.push(Candidate {
            outer,
            holes: region.holes.iter().filter_map(|h| strip(h)).collect(),
            fills: region.fills.clone(),
        });
    }
    if !flat.sources.is_empty() && candidates.is_empty() {
        return Err(Error::InvalidBooleanResult(
            "no region covers any fill source".into(),
        ));
    }

    // --- Face overlaps ---

    let oriented = |c: &BoolCoedge| -> Curve2d {
        let curve = result.edges[c.edge].curve;
        if c.reversed {
            curve.reversed()
        } else {
            curve
        }
    };
    let contour = |lp: &[BoolCoedge]| -> Contour {
        let curves: Vec<Curve2d> = lp.iter().map(&oriented).collect();
        tessellate_loop(&curves, arc_segments)
    };

    // A new input never takes the name of a live face it does not overlap
    let live_faces: FxHashMap<&str, usize> = flat
        .sources
        .iter()
        .enumerate()
        .flat_map(|(s, source)| {
            source
                .contributors
                .iter()
                .filter(|c| c.face.is_some())
                .map(move |c| (c.name.as_str(), s))
        })
        .collect();

    let mut claims = Vec::new();
    let mut prior_face_regions: FxHashMap<FaceKey, Vec<usize>> = FxHashMap::default();
    let mut overlaps: Vec<Vec<(f64, usize, usize)>> = Vec::with_capacity(candidates.len());
    let mut best_copy: FxHashMap<usize, (f64, usize, FaceKey)> = FxHashMap::default();

    for (r, cand) in candidates.iter().enumerate() {
        let contours: Vec<Contour> = std::iter::once(&cand.outer)
            .chain(&cand.holes)
            .map(|lp| contour(lp))
            .collect();
        let perimeter: f64 = cand
            .outer
            .iter()
            .map(|c| result.edges[c.edge].curve.length())
            .sum();
        let eps = tolerance * perimeter;

        let mut found = Vec::new();
        for &s in &cand.fills {
            let Some(source) = flat.sources.get(s) else {
                continue;
            };
            for (ci, contributor) in source.contributors.iter().enumerate() {
                let area = intersection_area(&contours, &contributor.loops);
                if area <= eps {
                    continue;
                }
                found.push((area, s, ci));
                let shadowed = contributor.new_input
                    && live_faces
                        .get(contributor.name.as_str())
                        .is_some_and(|live| !cand.fills.contains(live));
                if !shadowed {
                    claims.push(Claim {
                        target: r,
                        name: contributor.name.clone(),
                        overlap: area,
                    });
                }
                if let Some(fk) = contributor.face {
                    let regions = prior_face_regions.entry(fk).or_default();
                    if !regions.contains(&r) {
                        regions.push(r);
                    }
                }
                if let Some(copied) = source.copy_of {
                    let best = best_copy.entry(s).or_insert((area, r, copied));
                    if area > best.0 {
                        *best = (area, r, copied);
                    }
                }
            }
        }
        if found.is_empty() {
            tracing::warn!(
                region = r,
                fills = ?cand.fills,
                "Region overlaps none of its contributors, naming it fresh"
            );
        }
        found.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
        overlaps.push(found);
    }

    let assignment = resolve_claims(candidates.len(), &claims);
    let mut used: FxHashSet<String> = assignment.names.iter().flatten().cloned().collect();
    let prior_names: FxHashSet<&str> = sketch.faces.values().map(|f| f.name.as_str()).collect();

    let mut regions = Vec::with_capacity(candidates.len());
    for (r, cand) in candidates.into_iter().enumerate() {
        let name = match &assignment.names[r] {
            Some(n) => n.clone(),
            None => {
                let fresh = names.fresh_face(|n| used.contains(n) || prior_names.contains(n));
                used.insert(fresh.clone());
                fresh
            }
        };
        let lineage = &overlaps[r];
        let contributor = |&(_, s, ci): &(f64, usize, usize)| &flat.sources[s].contributors[ci];
        let payload_from = lineage.iter().map(&contributor).find_map(|c| c.payload_from);
        regions.push(ReconciledRegion {
            outer: cand.outer,
            holes: cand.holes,
            name,
            sources: assignment.sources[r].clone(),
            payload_from,
        });
    }

    let mut copies: Vec<(FaceKey, usize)> =
        best_copy.into_values().map(|(_, r, fk)| (fk, r)).collect();
    copies.sort_unstable_by_key(|&(fk, r)| (r, fk));

    let edge_names = name_edges(sketch, flat, result, &regions, &edge_ends, names, tolerance);
    tracing::debug!(
        regions = regions.len(),
        named_edges = edge_names.len(),
        point_coedges = point_coedges.len(),
        "Reconciled boolean result"
    );

    Ok(Reconciled {
        regions,
        edge_ends,
        edge_names,
        point_coedges,
        prior_face_regions,
        copies,
    })
}

/// Names every engine edge used by a region.
///
/// A piece that matches a prior edge exactly (same canonical end points,
/// same span) keeps that edge's name. The rest inherit by overlap length
/// along the input curves they lie on.
fn name_edges<P>(
    sketch: &Sketch<P>,
    flat: &Flattened,
    result: &BoolResult,
    regions: &[ReconciledRegion],
    edge_ends: &[(CanonicalId, CanonicalId)],
    names: &mut NameAllocator,
    tolerance: f64,
) -> FxHashMap<usize, EdgeName> {
    let mut used_edges: Vec<usize> = regions
        .iter()
        .flat_map(|r| std::iter::once(&r.outer).chain(&r.holes))
        .flatten()
        .map(|c| c.edge)
        .collect();
    used_edges.sort_unstable();
    used_edges.dedup();

    let mut named: FxHashMap<usize, EdgeName> = FxHashMap::default();
    let mut reused: FxHashSet<String> = FxHashSet::default();
    let mut pending = Vec::new();

    for &k in &used_edges {
        let piece = &result.edges[k];
        let (a, b) = edge_ends[k];
        let exact = piece.sources.iter().find_map(|&i| {
            let old = flat.origins[i]?;
            let edge = sketch.edges.get(old)?;
            let oa = flat.points.find(&sketch.points.get(edge.start)?.position)?;
            let ob = flat.points.find(&sketch.points.get(edge.end)?.position)?;
            let same_ends = (oa, ob) == (a, b) || (oa, ob) == (b, a);
            (same_ends && piece.curve.same_span(&edge.curve, tolerance)).then(|| edge.name.clone())
        });
        match exact {
            Some(name) if !reused.contains(&name) => {
                reused.insert(name.clone());
                named.insert(
                    k,
                    EdgeName {
                        sources: vec![name.clone()],
                        name,
                    },
                );
            }
            _ => pending.push(k),
        }
    }

    let retained: FxHashSet<&str> = flat
        .edges
        .iter()
        .zip(&flat.origins)
        .filter(|(_, origin)| origin.is_some())
        .map(|(input, _)| input.topology_id.as_str())
        .collect();

    let mut claims = Vec::new();
    for (target, &k) in pending.iter().enumerate() {
        let piece = &result.edges[k];
        for &i in &piece.sources {
            let input = &flat.edges[i];
            let name = input.topology_id.as_str();
            // A new curve named like a retained edge it does not lie on
            let shadowed = flat.origins[i].is_none()
                && retained.contains(name)
                && !piece
                    .sources
                    .iter()
                    .any(|&j| flat.origins[j].is_some() && flat.edges[j].topology_id == name);
            if shadowed {
                continue;
            }
            claims.push(Claim {
                target,
                name: name.to_string(),
                overlap: piece.curve.overlap_length(&input.curve, tolerance),
            });
        }
    }
    let claimable: Vec<Claim> = claims
        .iter()
        .filter(|c| !reused.contains(&c.name))
        .cloned()
        .collect();
    let assignment = resolve_claims(pending.len(), &claimable);
    let full_sources = resolve_claims(pending.len(), &claims).sources;

    let prior_names: FxHashSet<&str> = sketch.edges.values().map(|e| e.name.as_str()).collect();
    let mut taken: FxHashSet<String> = reused;
    taken.extend(assignment.names.iter().flatten().cloned());

    for (target, &k) in pending.iter().enumerate() {
        let name = match &assignment.names[target] {
            Some(n) => n.clone(),
            None => {
                let fresh = names.fresh_edge(|n| taken.contains(n) || prior_names.contains(n));
                taken.insert(fresh.clone());
                fresh
            }
        };
        named.insert(
            k,
            EdgeName {
                name,
                sources: full_sources[target].clone(),
            },
        );
    }
    named
}
