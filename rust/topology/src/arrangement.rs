// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Default boolean engine: the planar arrangement of lines and arcs.
//!
//! ## Algorithm
//!
//! 1. Every input curve is cut at its intersections with every other curve
//!    (bounding boxes prefilter the pairs) and at T-junctions.
//! 2. Cut points and end points are snapped through a [`PointEncoder`] at
//!    the build tolerance, so the pieces share canonical vertices.
//! 3. Pieces with the same end vertices and midpoint are merged; the merged
//!    piece keeps every input curve it came from.
//! 4. Dangling pieces (an end vertex of degree one) are pruned repeatedly.
//! 5. Outgoing half-edges are sorted counter-clockwise around each vertex by
//!    tangent angle, ties broken by signed curvature. The loop successor of
//!    a half-edge is the outgoing half-edge just clockwise of its twin, which
//!    keeps the loop's face on the left.
//! 6. Loops with positive area are bounded regions; negative loops are the
//!    outer boundaries of connected components and become holes of the
//!    smallest region containing them (or are discarded when unbounded).
//! 7. Each region is classified against every fill source by even-odd
//!    parity of an interior sample point against the source's curves.

use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;

use crate::boolean::*;
use crate::curve::{intersections, Curve2d};
use crate::geometry::{loop_signed_area, point_in_curves};
use crate::spatial::{CanonicalId, PointEncoder};

/// Resolution of the angular sort; tangents closer than this tie.
const ANGLE_RESOLUTION: f64 = 1e-9;

/// Planar-arrangement implementation of [`BooleanEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrangementEngine;

impl BooleanEngine for ArrangementEngine {
    fn exbool(
        &self,
        edges: &[PointInEdge],
        tolerance: f64,
        options: BoolOptions,
    ) -> Result<BoolResult, BoolError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(BoolError::Failed(format!("invalid tolerance {tolerance}")));
        }
        if let Some(i) = edges.iter().position(|e| !is_finite(&e.curve)) {
            return Err(BoolError::NonFinite(i));
        }
        if edges.is_empty() {
            return Ok(BoolResult::default());
        }

        let offset = if options.scale_fix {
            bounds_center(edges)
        } else {
            Vector2::zeros()
        };
        let curves: Vec<Curve2d> = edges.iter().map(|e| e.curve.translated(&-offset)).collect();

        let mut arrangement = Arrangement::new(tolerance);
        arrangement.split(&curves);
        arrangement.prune_dangling();
        let graph = HalfEdges::new(&arrangement.pieces);
        let loops = graph.walk(&arrangement.pieces)?;

        let source_count = edges
            .iter()
            .flat_map(|e| e.regions.iter().copied())
            .max()
            .map_or(0, |m| m + 1);
        let mut fill_curves: Vec<Vec<&Curve2d>> = vec![Vec::new(); source_count];
        for (curve, edge) in curves.iter().zip(edges) {
            for &r in &edge.regions {
                fill_curves[r].push(curve);
            }
        }

        let regions = build_regions(&loops, &fill_curves, tolerance, options.clean);
        tracing::debug!(
            input = edges.len(),
            pieces = arrangement.pieces.len(),
            loops = loops.len(),
            regions = regions.len(),
            "Arrangement computed"
        );

        if source_count > 0 && regions.iter().all(|r| r.fills.is_empty()) {
            return Err(BoolError::NoRegions);
        }

        let edges = arrangement
            .pieces
            .into_iter()
            .map(|p| BoolEdge {
                curve: p.curve.translated(&offset),
                sources: p.sources,
            })
            .collect();
        Ok(BoolResult { edges, regions })
    }
}

fn is_finite(curve: &Curve2d) -> bool {
    let finite = |p: Point2<f64>| p.x.is_finite() && p.y.is_finite();
    match curve {
        Curve2d::Line(l) => finite(l.start) && finite(l.end),
        Curve2d::Arc(a) => {
            finite(a.center)
                && a.radius.is_finite()
                && a.start_angle.is_finite()
                && a.sweep.is_finite()
        }
    }
}

fn bounds_center(edges: &[PointInEdge]) -> Vector2<f64> {
    let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for e in edges {
        let (lo, hi) = e.curve.bounds();
        min = min.inf(&lo);
        max = max.sup(&hi);
    }
    (min.coords + max.coords) * 0.5
}

fn boxes_overlap(
    a: &(Point2<f64>, Point2<f64>),
    b: &(Point2<f64>, Point2<f64>),
    tolerance: f64,
) -> bool {
    a.0.x <= b.1.x + tolerance
        && b.0.x <= a.1.x + tolerance
        && a.0.y <= b.1.y + tolerance
        && b.0.y <= a.1.y + tolerance
}

/// A piece of the subdivision between two canonical vertices.
#[derive(Debug, Clone)]
struct Piece {
    curve: Curve2d,
    from: CanonicalId,
    to: CanonicalId,
    sources: Vec<usize>,
}

struct Arrangement {
    tolerance: f64,
    vertices: PointEncoder,
    midpoints: PointEncoder,
    pieces: Vec<Piece>,
    by_span: FxHashMap<(CanonicalId, CanonicalId, CanonicalId), usize>,
}

impl Arrangement {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            vertices: PointEncoder::new(tolerance),
            midpoints: PointEncoder::new(tolerance),
            pieces: Vec::new(),
            by_span: FxHashMap::default(),
        }
    }

    fn split(&mut self, curves: &[Curve2d]) {
        let tol = self.tolerance;
        let ends: Vec<(CanonicalId, CanonicalId)> = curves
            .iter()
            .map(|c| (self.vertices.encode(c.start()), self.vertices.encode(c.end())))
            .collect();
        let boxes: Vec<_> = curves.iter().map(Curve2d::bounds).collect();

        let mut cuts: Vec<Vec<CanonicalId>> = vec![Vec::new(); curves.len()];
        for i in 0..curves.len() {
            for j in (i + 1)..curves.len() {
                if !boxes_overlap(&boxes[i], &boxes[j], tol) {
                    continue;
                }
                for x in intersections(&curves[i], &curves[j], tol) {
                    let id = self.vertices.encode(x);
                    cuts[i].push(id);
                    cuts[j].push(id);
                }
            }
        }

        for (i, curve) in curves.iter().enumerate() {
            let (start, end) = ends[i];
            let mut stops: Vec<(f64, CanonicalId)> = cuts[i]
                .iter()
                .filter(|&&id| id != start && id != end)
                .map(|&id| {
                    let t = curve.param_at(&self.vertices.position(id)).clamp(0.0, 1.0);
                    (t, id)
                })
                .collect();
            stops.push((0.0, start));
            stops.push((1.0, end));
            stops.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let length = curve.length();
            stops.dedup_by(|later, earlier| {
                later.1 == earlier.1 && (later.0 - earlier.0) * length <= 2.0 * tol
            });

            for w in stops.windows(2) {
                let ((t0, a), (t1, b)) = (w[0], w[1]);
                if a == b {
                    // Closed stretch (a full circle given as one arc)
                    if (t1 - t0) * curve.length() > 2.0 * tol {
                        let mid = self.vertices.encode(curve.point_at((t0 + t1) * 0.5));
                        let tm = (t0 + t1) * 0.5;
                        self.add_piece(curve, (t0, a), (tm, mid), i);
                        self.add_piece(curve, (tm, mid), (t1, b), i);
                    }
                    continue;
                }
                self.add_piece(curve, (t0, a), (t1, b), i);
            }
        }
    }

    fn add_piece(
        &mut self,
        curve: &Curve2d,
        (t0, from): (f64, CanonicalId),
        (t1, to): (f64, CanonicalId),
        source: usize,
    ) {
        if from == to {
            return;
        }
        let piece = curve
            .sub(t0, t1)
            .with_endpoints(self.vertices.position(from), self.vertices.position(to));
        let mid = self.midpoints.encode(piece.midpoint());
        let key = (from.min(to), from.max(to), mid);
        match self.by_span.get(&key) {
            Some(&k) => {
                let sources = &mut self.pieces[k].sources;
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
            None => {
                self.by_span.insert(key, self.pieces.len());
                self.pieces.push(Piece {
                    curve: piece,
                    from,
                    to,
                    sources: vec![source],
                });
            }
        }
    }

    /// Removes pieces that hang off the subdivision by one end.
    fn prune_dangling(&mut self) {
        let mut incident: FxHashMap<CanonicalId, Vec<usize>> = FxHashMap::default();
        for (k, p) in self.pieces.iter().enumerate() {
            incident.entry(p.from).or_default().push(k);
            incident.entry(p.to).or_default().push(k);
        }
        let mut alive = vec![true; self.pieces.len()];
        let mut degree: FxHashMap<CanonicalId, usize> =
            incident.iter().map(|(&v, es)| (v, es.len())).collect();
        let mut queue: Vec<CanonicalId> = degree
            .iter()
            .filter(|(_, &d)| d == 1)
            .map(|(&v, _)| v)
            .collect();
        queue.sort_unstable();

        while let Some(v) = queue.pop() {
            let Some(&k) = incident[&v].iter().find(|&&k| alive[k]) else {
                continue;
            };
            alive[k] = false;
            for end in [self.pieces[k].from, self.pieces[k].to] {
                if let Some(d) = degree.get_mut(&end) {
                    *d -= 1;
                    if *d == 1 {
                        queue.push(end);
                    }
                }
            }
        }

        let mut keep = alive.into_iter();
        self.pieces.retain(|_| keep.next().unwrap_or(false));
    }
}

/// Half-edge `2k` runs along piece `k`, `2k + 1` against it.
struct HalfEdges {
    /// Outgoing half-edges per vertex in counter-clockwise order.
    around: FxHashMap<CanonicalId, Vec<usize>>,
    /// Position of each half-edge in its tail vertex's list.
    slot: Vec<usize>,
}

impl HalfEdges {
    fn new(pieces: &[Piece]) -> Self {
        let mut around: FxHashMap<CanonicalId, Vec<usize>> = FxHashMap::default();
        for (k, p) in pieces.iter().enumerate() {
            around.entry(p.from).or_default().push(2 * k);
            around.entry(p.to).or_default().push(2 * k + 1);
        }
        let mut slot = vec![0; pieces.len() * 2];
        for list in around.values_mut() {
            list.sort_by_key(|&h| {
                let curve = oriented(pieces, h);
                let t = curve.tangent_at(0.0);
                let angle = (t.y.atan2(t.x) / ANGLE_RESOLUTION).round() as i64;
                let bend = (curve.curvature() / ANGLE_RESOLUTION).round() as i64;
                (angle, bend, h)
            });
            for (i, &h) in list.iter().enumerate() {
                slot[h] = i;
            }
        }
        Self { around, slot }
    }

    fn head(pieces: &[Piece], h: usize) -> CanonicalId {
        let p = &pieces[h / 2];
        if h % 2 == 0 {
            p.to
        } else {
            p.from
        }
    }

    fn next(&self, pieces: &[Piece], h: usize) -> usize {
        let list = &self.around[&Self::head(pieces, h)];
        let twin = h ^ 1;
        list[(self.slot[twin] + list.len() - 1) % list.len()]
    }

    fn walk(&self, pieces: &[Piece]) -> Result<Vec<Loop>, BoolError> {
        let total = pieces.len() * 2;
        let mut visited = vec![false; total];
        let mut loops = Vec::new();
        for start in 0..total {
            if visited[start] {
                continue;
            }
            let mut half_edges = Vec::new();
            let mut h = start;
            loop {
                visited[h] = true;
                half_edges.push(h);
                h = self.next(pieces, h);
                if h == start {
                    break;
                }
                if half_edges.len() > total {
                    return Err(BoolError::Failed("face walk did not close".into()));
                }
            }
            loops.push(Loop::new(pieces, half_edges));
        }
        Ok(loops)
    }
}

fn oriented(pieces: &[Piece], h: usize) -> Curve2d {
    let c = pieces[h / 2].curve;
    if h % 2 == 0 {
        c
    } else {
        c.reversed()
    }
}

/// A closed walk of half-edges.
struct Loop {
    half_edges: Vec<usize>,
    curves: Vec<Curve2d>,
    area: f64,
    perimeter: f64,
}

impl Loop {
    fn new(pieces: &[Piece], half_edges: Vec<usize>) -> Self {
        let curves: Vec<Curve2d> = half_edges.iter().map(|&h| oriented(pieces, h)).collect();
        let area = loop_signed_area(&curves);
        let perimeter = curves.iter().map(Curve2d::length).sum();
        Self {
            half_edges,
            curves,
            area,
            perimeter,
        }
    }

    fn is_sliver(&self, tolerance: f64) -> bool {
        self.area.abs() <= tolerance * self.perimeter
    }

    /// Points just left of each curve's midpoint, longest curve first.
    fn left_samples(&self, tolerance: f64) -> impl Iterator<Item = Point2<f64>> + '_ {
        let mut order: Vec<usize> = (0..self.curves.len()).collect();
        order.sort_by(|&a, &b| {
            self.curves[b]
                .length()
                .total_cmp(&self.curves[a].length())
                .then(a.cmp(&b))
        });
        order.into_iter().map(move |i| {
            let c = &self.curves[i];
            let t = c.tangent_at(0.5);
            let eps = (c.length() * 1e-3).max(tolerance * 10.0);
            c.midpoint() + Vector2::new(-t.y, t.x) * eps
        })
    }

    fn coedges(&self) -> Vec<BoolCoedge> {
        self.half_edges
            .iter()
            .map(|&h| BoolCoedge {
                edge: h / 2,
                reversed: h % 2 == 1,
            })
            .collect()
    }
}

fn build_regions(
    loops: &[Loop],
    fill_curves: &[Vec<&Curve2d>],
    tolerance: f64,
    clean: bool,
) -> Vec<BoolRegion> {
    let bounded: Vec<usize> = (0..loops.len())
        .filter(|&i| loops[i].area > 0.0 && !(clean && loops[i].is_sliver(tolerance)))
        .collect();

    let mut holes: Vec<Vec<usize>> = vec![Vec::new(); bounded.len()];
    for (i, lp) in loops.iter().enumerate() {
        if lp.area >= 0.0 || (clean && lp.is_sliver(tolerance)) {
            continue;
        }
        let Some(sample) = lp.left_samples(tolerance).next() else {
            continue;
        };
        let container = bounded
            .iter()
            .enumerate()
            .filter(|(_, &b)| point_in_curves(&sample, &loops[b].curves))
            .min_by(|(_, &a), (_, &b)| loops[a].area.total_cmp(&loops[b].area))
            .map(|(slot, _)| slot);
        if let Some(slot) = container {
            holes[slot].push(i);
        }
    }

    bounded
        .iter()
        .zip(holes)
        .map(|(&b, hole_ids)| {
            let outer = &loops[b];
            let inside = |p: &Point2<f64>| {
                point_in_curves(p, &outer.curves)
                    && hole_ids
                        .iter()
                        .all(|&h| !point_in_curves(p, &loops[h].curves))
            };
            let sample = outer
                .left_samples(tolerance)
                .find(|p| inside(p))
                .or_else(|| outer.left_samples(tolerance).next());
            let fills = match sample {
                Some(p) => (0..fill_curves.len())
                    .filter(|&s| point_in_curves(&p, fill_curves[s].iter().copied()))
                    .collect(),
                None => Vec::new(),
            };
            BoolRegion {
                outer: outer.coedges(),
                holes: hole_ids.iter().map(|&h| loops[h].coedges()).collect(),
                fills,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: f64 = 1e-6;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64, region: usize) -> Vec<PointInEdge> {
        let c = [p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1)];
        (0..4)
            .map(|i| PointInEdge {
                curve: Curve2d::line(c[i], c[(i + 1) % 4]),
                topology_id: String::new(),
                regions: vec![region],
            })
            .collect()
    }

    fn region_area(result: &BoolResult, r: &BoolRegion) -> f64 {
        let curves = |lp: &Vec<BoolCoedge>| -> Vec<Curve2d> {
            lp.iter()
                .map(|c| {
                    let curve = result.edges[c.edge].curve;
                    if c.reversed {
                        curve.reversed()
                    } else {
                        curve
                    }
                })
                .collect()
        };
        loop_signed_area(&curves(&r.outer))
            + r.holes.iter().map(|h| loop_signed_area(&curves(h))).sum::<f64>()
    }

    #[test]
    fn single_rectangle() {
        let input = rect(0.0, 0.0, 4.0, 3.0, 0);
        let out = ArrangementEngine
            .exbool(&input, TOL, BoolOptions::default())
            .unwrap();
        assert_eq!(out.edges.len(), 4);
        assert_eq!(out.regions.len(), 1);
        assert_eq!(out.regions[0].outer.len(), 4);
        assert_eq!(out.regions[0].fills, vec![0]);
        assert_relative_eq!(region_area(&out, &out.regions[0]), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_rectangles_split_into_three() {
        let mut input = rect(0.0, 0.0, 4.0, 4.0, 0);
        input.extend(rect(2.0, 2.0, 6.0, 6.0, 1));
        let out = ArrangementEngine
            .exbool(&input, TOL, BoolOptions::default())
            .unwrap();
        assert_eq!(out.regions.len(), 3);
        let mut fills: Vec<Vec<usize>> = out.regions.iter().map(|r| r.fills.clone()).collect();
        fills.sort();
        assert_eq!(fills, vec![vec![0], vec![0, 1], vec![1]]);
        let total: f64 = out.regions.iter().map(|r| region_area(&out, r)).sum();
        assert_relative_eq!(total, 28.0, epsilon = 1e-9);
    }

    #[test]
    fn shared_edge_is_merged_with_both_sources() {
        let mut input = rect(0.0, 0.0, 4.0, 3.0, 0);
        input.extend(rect(4.0, 0.0, 8.0, 3.0, 1));
        let out = ArrangementEngine
            .exbool(&input, TOL, BoolOptions::default())
            .unwrap();
        assert_eq!(out.edges.len(), 7);
        let shared: Vec<&BoolEdge> = out.edges.iter().filter(|e| e.sources.len() == 2).collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(out.regions.len(), 2);
    }

    #[test]
    fn nested_square_becomes_hole_and_island() {
        let mut input = rect(0.0, 0.0, 10.0, 10.0, 0);
        input.extend(rect(4.0, 4.0, 6.0, 6.0, 1));
        let out = ArrangementEngine
            .exbool(&input, TOL, BoolOptions::default())
            .unwrap();
        assert_eq!(out.regions.len(), 2);
        let ring = out.regions.iter().find(|r| !r.holes.is_empty()).unwrap();
        assert_eq!(ring.fills, vec![0]);
        assert_relative_eq!(region_area(&out, ring), 96.0, epsilon = 1e-9);
        let island = out.regions.iter().find(|r| r.holes.is_empty()).unwrap();
        assert_eq!(island.fills, vec![0, 1]);
    }

    #[test]
    fn dangling_path_is_pruned() {
        let mut input = rect(0.0, 0.0, 4.0, 4.0, 0);
        input.push(PointInEdge {
            curve: Curve2d::line(p(2.0, 2.0), p(6.0, 2.0)),
            topology_id: String::new(),
            regions: Vec::new(),
        });
        let out = ArrangementEngine
            .exbool(&input, TOL, BoolOptions::default())
            .unwrap();
        // Right side is cut at (4, 2); both stubs of the path dangle
        assert_eq!(out.edges.len(), 5);
        assert_eq!(out.regions.len(), 1);
    }

    #[test]
    fn open_path_across_region_splits_it() {
        let mut input = rect(0.0, 0.0, 4.0, 4.0, 0);
        input.push(PointInEdge {
            curve: Curve2d::line(p(2.0, -1.0), p(2.0, 5.0)),
            topology_id: String::new(),
            regions: Vec::new(),
        });
        let out = ArrangementEngine
            .exbool(&input, TOL, BoolOptions::default())
            .unwrap();
        assert_eq!(out.regions.len(), 2);
        assert!(out.regions.iter().all(|r| r.fills == vec![0]));
    }

    #[test]
    fn disc_with_arcs() {
        let input: Vec<PointInEdge> = Curve2d::circle(p(0.0, 0.0), 2.0)
            .into_iter()
            .map(|curve| PointInEdge {
                curve,
                topology_id: String::new(),
                regions: vec![0],
            })
            .collect();
        let out = ArrangementEngine
            .exbool(&input, TOL, BoolOptions::default())
            .unwrap();
        assert_eq!(out.regions.len(), 1);
        assert_relative_eq!(
            region_area(&out, &out.regions[0]),
            4.0 * std::f64::consts::PI,
            epsilon = 1e-9
        );
    }

    #[test]
    fn scale_fix_preserves_coordinates() {
        let input = rect(1e6, 1e6, 1e6 + 4.0, 1e6 + 3.0, 0);
        let out = ArrangementEngine
            .exbool(&input, TOL, BoolOptions { scale_fix: true, ..Default::default() })
            .unwrap();
        assert_eq!(out.regions.len(), 1);
        let starts: Vec<Point2<f64>> = out.edges.iter().map(|e| e.curve.start()).collect();
        assert!(starts.iter().any(|s| (s - p(1e6, 1e6)).norm() < 1e-6));
    }

    #[test]
    fn clean_drops_sliver_regions() {
        let tol = 1e-3;
        let mut input = rect(0.0, 0.0, 4.0, 4.0, 0);
        // Apex 3.5 tolerances above a 10-unit base: area below tolerance times perimeter
        let c = [p(0.0, 10.0), p(10.0, 10.0), p(5.0, 10.0035)];
        input.extend((0..3).map(|i| PointInEdge {
            curve: Curve2d::line(c[i], c[(i + 1) % 3]),
            topology_id: String::new(),
            regions: vec![1],
        }));

        let cleaned = ArrangementEngine
            .exbool(&input, tol, BoolOptions::default())
            .unwrap();
        assert_eq!(cleaned.regions.len(), 1);
        assert_relative_eq!(region_area(&cleaned, &cleaned.regions[0]), 16.0, epsilon = 1e-9);

        let kept = ArrangementEngine
            .exbool(&input, tol, BoolOptions { clean: false, ..Default::default() })
            .unwrap();
        assert_eq!(kept.regions.len(), 2);
    }

    #[test]
    fn arc_segments_do_not_change_exact_result() {
        let input: Vec<PointInEdge> = Curve2d::circle(p(0.0, 0.0), 1.0)
            .into_iter()
            .map(|curve| PointInEdge {
                curve,
                topology_id: String::new(),
                regions: vec![0],
            })
            .collect();
        let coarse = ArrangementEngine
            .exbool(&input, TOL, BoolOptions { arc_segments: 4, ..Default::default() })
            .unwrap();
        let fine = ArrangementEngine
            .exbool(&input, TOL, BoolOptions::default())
            .unwrap();
        assert_eq!(coarse, fine);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut input = rect(0.0, 0.0, 1.0, 1.0, 0);
        input[2].curve = Curve2d::line(p(f64::NAN, 0.0), p(0.0, 1.0));
        assert_eq!(
            ArrangementEngine.exbool(&input, TOL, BoolOptions::default()),
            Err(BoolError::NonFinite(2))
        );
    }

    #[test]
    fn fill_without_area_reports_no_regions() {
        // Collinear "triangle"
        let c = [p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)];
        let input: Vec<PointInEdge> = (0..3)
            .map(|i| PointInEdge {
                curve: Curve2d::line(c[i], c[(i + 1) % 3]),
                topology_id: String::new(),
                regions: vec![0],
            })
            .collect();
        assert_eq!(
            ArrangementEngine.exbool(&input, TOL, BoolOptions::default()),
            Err(BoolError::NoRegions)
        );
    }
}
