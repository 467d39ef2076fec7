// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D curve primitives: line segments and circular arcs.
//!
//! Curves are parameterised over `[0, 1]` from start to end. All tolerance
//! based predicates take the tolerance explicitly so that the same value the
//! boolean step snaps with is used everywhere.

use std::f64::consts::{FRAC_PI_2, TAU};

use nalgebra::{Matrix3, Point2, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Relative threshold below which two directions count as parallel.
const PARALLEL_EPS: f64 = 1e-12;

/// A straight segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line2d {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

/// A circular arc. `sweep` is signed: positive is counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc2d {
    pub center: Point2<f64>,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
}

/// A boundary curve of the sketch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Curve2d {
    Line(Line2d),
    Arc(Arc2d),
}

/// 2D cross product (z component of the 3D cross product).
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

impl Arc2d {
    /// Builds an arc from its center and two end points. The radius is the
    /// mean of both end point distances.
    pub fn from_endpoints(
        center: Point2<f64>,
        start: Point2<f64>,
        end: Point2<f64>,
        ccw: bool,
    ) -> Self {
        let radius = ((start - center).norm() + (end - center).norm()) * 0.5;
        let a0 = (start.y - center.y).atan2(start.x - center.x);
        let a1 = (end.y - center.y).atan2(end.x - center.x);
        let mut span = if ccw {
            (a1 - a0).rem_euclid(TAU)
        } else {
            (a0 - a1).rem_euclid(TAU)
        };
        if span <= 1e-12 {
            span = TAU;
        }
        Self {
            center,
            radius,
            start_angle: a0,
            sweep: if ccw { span } else { -span },
        }
    }

    fn point_at_angle(&self, angle: f64) -> Point2<f64> {
        self.center + Vector2::new(angle.cos(), angle.sin()) * self.radius
    }

    /// Angular parameter of `p` projected onto the carrier circle.
    ///
    /// Values slightly outside `[0, 1]` are returned for points just before
    /// the start or just past the end; the gap opposite the arc is split
    /// evenly between the two.
    fn angle_param(&self, p: &Point2<f64>) -> f64 {
        let span = self.sweep.abs();
        if span < PARALLEL_EPS {
            return 0.0;
        }
        let phi = (p.y - self.center.y).atan2(p.x - self.center.x);
        let mut delta = if self.sweep >= 0.0 {
            (phi - self.start_angle).rem_euclid(TAU)
        } else {
            (self.start_angle - phi).rem_euclid(TAU)
        };
        if delta > span + (TAU - span) * 0.5 {
            delta -= TAU;
        }
        delta / span
    }
}

impl Curve2d {
    /// Line segment between two points.
    pub fn line(start: Point2<f64>, end: Point2<f64>) -> Self {
        Curve2d::Line(Line2d { start, end })
    }

    /// Arc around `center` from `start` to `end`, counter-clockwise if `ccw`.
    pub fn arc(center: Point2<f64>, start: Point2<f64>, end: Point2<f64>, ccw: bool) -> Self {
        Curve2d::Arc(Arc2d::from_endpoints(center, start, end, ccw))
    }

    /// A full counter-clockwise circle as two half arcs.
    pub fn circle(center: Point2<f64>, radius: f64) -> [Curve2d; 2] {
        let east = center + Vector2::new(radius, 0.0);
        let west = center - Vector2::new(radius, 0.0);
        [
            Curve2d::Arc(Arc2d {
                center,
                radius,
                start_angle: 0.0,
                sweep: std::f64::consts::PI,
            }),
            Curve2d::Arc(Arc2d::from_endpoints(center, west, east, true)),
        ]
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, Curve2d::Arc(_))
    }

    pub fn start(&self) -> Point2<f64> {
        match self {
            Curve2d::Line(l) => l.start,
            Curve2d::Arc(a) => a.point_at_angle(a.start_angle),
        }
    }

    pub fn end(&self) -> Point2<f64> {
        match self {
            Curve2d::Line(l) => l.end,
            Curve2d::Arc(a) => a.point_at_angle(a.start_angle + a.sweep),
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Curve2d::Line(l) => (l.end - l.start).norm(),
            Curve2d::Arc(a) => a.radius * a.sweep.abs(),
        }
    }

    /// Point at parameter `t` (`0` is the start, `1` the end).
    pub fn point_at(&self, t: f64) -> Point2<f64> {
        match self {
            Curve2d::Line(l) => l.start + (l.end - l.start) * t,
            Curve2d::Arc(a) => a.point_at_angle(a.start_angle + a.sweep * t),
        }
    }

    pub fn midpoint(&self) -> Point2<f64> {
        self.point_at(0.5)
    }

    /// Parameter of the projection of `p` onto the carrier (unclamped).
    pub fn param_at(&self, p: &Point2<f64>) -> f64 {
        match self {
            Curve2d::Line(l) => {
                let d = l.end - l.start;
                let len_sq = d.norm_squared();
                if len_sq < PARALLEL_EPS {
                    return 0.0;
                }
                (p - l.start).dot(&d) / len_sq
            }
            Curve2d::Arc(a) => a.angle_param(p),
        }
    }

    /// Shortest distance from `p` to the curve.
    pub fn distance_to(&self, p: &Point2<f64>) -> f64 {
        let t = self.param_at(p);
        match self {
            Curve2d::Line(_) => (p - self.point_at(t.clamp(0.0, 1.0))).norm(),
            Curve2d::Arc(a) => {
                if (0.0..=1.0).contains(&t) {
                    ((p - a.center).norm() - a.radius).abs()
                } else {
                    (p - self.start()).norm().min((p - self.end()).norm())
                }
            }
        }
    }

    pub fn contains_point(&self, p: &Point2<f64>, tolerance: f64) -> bool {
        self.distance_to(p) <= tolerance
    }

    /// Same curve traversed from end to start.
    pub fn reversed(&self) -> Self {
        match self {
            Curve2d::Line(l) => Curve2d::line(l.end, l.start),
            Curve2d::Arc(a) => Curve2d::Arc(Arc2d {
                center: a.center,
                radius: a.radius,
                start_angle: a.start_angle + a.sweep,
                sweep: -a.sweep,
            }),
        }
    }

    /// Portion of the curve between parameters `t0` and `t1`.
    pub fn sub(&self, t0: f64, t1: f64) -> Self {
        match self {
            Curve2d::Line(_) => Curve2d::line(self.point_at(t0), self.point_at(t1)),
            Curve2d::Arc(a) => Curve2d::Arc(Arc2d {
                center: a.center,
                radius: a.radius,
                start_angle: a.start_angle + a.sweep * t0,
                sweep: a.sweep * (t1 - t0),
            }),
        }
    }

    /// Same carrier with its end points moved to `start` and `end`.
    ///
    /// Used to snap end points onto canonical points; the moves are expected
    /// to be within tolerance so arcs keep their center and direction.
    pub fn with_endpoints(&self, start: Point2<f64>, end: Point2<f64>) -> Self {
        match self {
            Curve2d::Line(_) => Curve2d::line(start, end),
            Curve2d::Arc(a) => {
                let mut snapped = Arc2d::from_endpoints(a.center, start, end, a.sweep > 0.0);
                if a.sweep.abs() > TAU - 1e-9 && (end - start).norm() < 1e-12 {
                    snapped.sweep = a.sweep;
                }
                Curve2d::Arc(snapped)
            }
        }
    }

    pub fn translated(&self, offset: &Vector2<f64>) -> Self {
        match self {
            Curve2d::Line(l) => Curve2d::line(l.start + offset, l.end + offset),
            Curve2d::Arc(a) => Curve2d::Arc(Arc2d {
                center: a.center + offset,
                ..*a
            }),
        }
    }

    /// Unit tangent in the direction of travel at parameter `t`.
    pub fn tangent_at(&self, t: f64) -> Vector2<f64> {
        match self {
            Curve2d::Line(l) => (l.end - l.start).normalize(),
            Curve2d::Arc(a) => {
                let angle = a.start_angle + a.sweep * t;
                let radial = Vector2::new(angle.cos(), angle.sin());
                if a.sweep >= 0.0 {
                    Vector2::new(-radial.y, radial.x)
                } else {
                    Vector2::new(radial.y, -radial.x)
                }
            }
        }
    }

    /// Signed curvature: positive when the curve turns left.
    pub fn curvature(&self) -> f64 {
        match self {
            Curve2d::Line(_) => 0.0,
            Curve2d::Arc(a) => a.sweep.signum() / a.radius,
        }
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        let s = self.start();
        let e = self.end();
        let mut min = Point2::new(s.x.min(e.x), s.y.min(e.y));
        let mut max = Point2::new(s.x.max(e.x), s.y.max(e.y));
        if let Curve2d::Arc(a) = self {
            for k in 0..4 {
                let p = a.point_at_angle(k as f64 * FRAC_PI_2);
                let t = a.angle_param(&p);
                if (0.0..=1.0).contains(&t) {
                    min.x = min.x.min(p.x);
                    min.y = min.y.min(p.y);
                    max.x = max.x.max(p.x);
                    max.y = max.y.max(p.y);
                }
            }
        }
        (min, max)
    }

    /// Appends a polyline approximation to `out`, without the end point.
    ///
    /// `arc_segments` is the segment count of a full circle.
    pub fn tessellate_into(&self, out: &mut Vec<[f64; 2]>, arc_segments: usize) {
        match self {
            Curve2d::Line(l) => out.push([l.start.x, l.start.y]),
            Curve2d::Arc(a) => {
                let n = ((a.sweep.abs() / TAU) * arc_segments.max(4) as f64)
                    .ceil()
                    .max(1.0) as usize;
                for k in 0..n {
                    let p = self.point_at(k as f64 / n as f64);
                    out.push([p.x, p.y]);
                }
            }
        }
    }

    /// Contribution of this curve to the signed area of a closed loop
    /// (shoelace chord term plus the circular segment for arcs).
    pub fn signed_area_term(&self) -> f64 {
        let s = self.start();
        let e = self.end();
        let chord = (s.x * e.y - e.x * s.y) * 0.5;
        match self {
            Curve2d::Line(_) => chord,
            Curve2d::Arc(a) => chord + a.radius * a.radius * 0.5 * (a.sweep - a.sweep.sin()),
        }
    }

    /// `true` if both curves have the same kind, end points and midpoint
    /// within tolerance, in the same direction.
    pub fn approx_eq(&self, other: &Curve2d, tolerance: f64) -> bool {
        self.is_arc() == other.is_arc()
            && (self.start() - other.start()).norm() <= tolerance
            && (self.end() - other.end()).norm() <= tolerance
            && (self.midpoint() - other.midpoint()).norm() <= tolerance
    }

    /// Like [`Curve2d::approx_eq`] but ignoring direction.
    pub fn same_span(&self, other: &Curve2d, tolerance: f64) -> bool {
        self.approx_eq(other, tolerance) || self.approx_eq(&other.reversed(), tolerance)
    }

    /// Length of the part of `self` that runs along `carrier`, measured as a
    /// parameter range on the carrier. Zero when `self` does not lie on it.
    pub fn overlap_length(&self, carrier: &Curve2d, tolerance: f64) -> f64 {
        let s = self.start();
        let e = self.end();
        let m = self.midpoint();
        if self.is_arc() != carrier.is_arc() {
            return 0.0;
        }
        if !(carrier.contains_point(&s, tolerance)
            && carrier.contains_point(&e, tolerance)
            && carrier.contains_point(&m, tolerance))
        {
            return 0.0;
        }
        let t0 = carrier.param_at(&s).clamp(0.0, 1.0);
        let t1 = carrier.param_at(&e).clamp(0.0, 1.0);
        (t1 - t0).abs() * carrier.length()
    }

    /// Applies a 2D homogeneous transform. Returns `None` for arcs under a
    /// transform that is not a similarity (it would produce an ellipse).
    pub fn transformed(&self, m: &Matrix3<f64>) -> Option<Self> {
        let apply = |p: Point2<f64>| {
            let v = m * Vector3::new(p.x, p.y, 1.0);
            Point2::new(v.x, v.y)
        };
        match self {
            Curve2d::Line(l) => Some(Curve2d::line(apply(l.start), apply(l.end))),
            Curve2d::Arc(a) => {
                let cx = Vector2::new(m[(0, 0)], m[(1, 0)]);
                let cy = Vector2::new(m[(0, 1)], m[(1, 1)]);
                let scale = cx.norm();
                let similar = (cy.norm() - scale).abs() <= 1e-9 * scale.max(1.0)
                    && cx.dot(&cy).abs() <= 1e-9 * scale.max(1.0) * scale.max(1.0);
                if !similar || scale < PARALLEL_EPS {
                    return None;
                }
                let flipped = cross(&cx, &cy) < 0.0;
                let ccw = (a.sweep > 0.0) != flipped;
                let mut arc = Arc2d::from_endpoints(
                    apply(a.center),
                    apply(self.start()),
                    apply(self.end()),
                    ccw,
                );
                arc.radius = a.radius * scale;
                if a.sweep.abs() > TAU - 1e-9 {
                    arc.sweep = if ccw { TAU } else { -TAU };
                }
                Some(Curve2d::Arc(arc))
            }
        }
    }
}

/// All points where `a` and `b` meet within `tolerance`.
///
/// Proper crossings are solved analytically; overlapping collinear or
/// co-circular stretches and near touches are reported through the end
/// points of one curve lying on the other.
pub fn intersections(a: &Curve2d, b: &Curve2d, tolerance: f64) -> Vec<Point2<f64>> {
    let mut candidates = match (a, b) {
        (Curve2d::Line(la), Curve2d::Line(lb)) => line_line(la, lb),
        (Curve2d::Line(l), Curve2d::Arc(c)) | (Curve2d::Arc(c), Curve2d::Line(l)) => {
            line_circle(l, &c.center, c.radius, tolerance)
        }
        (Curve2d::Arc(ca), Curve2d::Arc(cb)) => {
            circle_circle(&ca.center, ca.radius, &cb.center, cb.radius, tolerance)
        }
    };
    for p in [a.start(), a.end()] {
        if b.contains_point(&p, tolerance) {
            candidates.push(p);
        }
    }
    for p in [b.start(), b.end()] {
        if a.contains_point(&p, tolerance) {
            candidates.push(p);
        }
    }

    let mut result: Vec<Point2<f64>> = Vec::with_capacity(candidates.len());
    for p in candidates {
        if !a.contains_point(&p, tolerance) || !b.contains_point(&p, tolerance) {
            continue;
        }
        if result.iter().all(|q| (q - p).norm() > tolerance) {
            result.push(p);
        }
    }
    result
}

fn line_line(a: &Line2d, b: &Line2d) -> Vec<Point2<f64>> {
    let da = a.end - a.start;
    let db = b.end - b.start;
    let denom = cross(&da, &db);
    if denom.abs() <= PARALLEL_EPS * da.norm() * db.norm() {
        return Vec::new();
    }
    let t = cross(&(b.start - a.start), &db) / denom;
    vec![a.start + da * t]
}

fn line_circle(
    l: &Line2d,
    center: &Point2<f64>,
    radius: f64,
    tolerance: f64,
) -> Vec<Point2<f64>> {
    let d = l.end - l.start;
    let len_sq = d.norm_squared();
    if len_sq < PARALLEL_EPS {
        return Vec::new();
    }
    let t = (center - l.start).dot(&d) / len_sq;
    let foot = l.start + d * t;
    let dist = (foot - center).norm();
    if (dist - radius).abs() <= tolerance {
        return vec![foot];
    }
    if dist > radius {
        return Vec::new();
    }
    let h = (radius * radius - dist * dist).sqrt();
    let dir = d / len_sq.sqrt();
    vec![foot + dir * h, foot - dir * h]
}

fn circle_circle(
    c1: &Point2<f64>,
    r1: f64,
    c2: &Point2<f64>,
    r2: f64,
    tolerance: f64,
) -> Vec<Point2<f64>> {
    let delta = c2 - c1;
    let d = delta.norm();
    if d < PARALLEL_EPS {
        return Vec::new();
    }
    if d > r1 + r2 + tolerance || d < (r1 - r2).abs() - tolerance {
        return Vec::new();
    }
    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h = (r1 * r1 - a * a).max(0.0).sqrt();
    let base = c1 + delta * (a / d);
    if h <= tolerance {
        return vec![base];
    }
    let perp = Vector2::new(-delta.y, delta.x) / d;
    vec![base + perp * h, base - perp * h]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-6;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn line_basics() {
        let c = Curve2d::line(p(0.0, 0.0), p(4.0, 0.0));
        assert_relative_eq!(c.length(), 4.0);
        assert_relative_eq!(c.param_at(&p(1.0, 3.0)), 0.25);
        assert_relative_eq!(c.distance_to(&p(1.0, 3.0)), 3.0);
        assert_relative_eq!(c.distance_to(&p(6.0, 0.0)), 2.0);
        assert_eq!(c.reversed().start(), p(4.0, 0.0));
    }

    #[test]
    fn arc_endpoints_and_length() {
        let c = Curve2d::arc(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), true);
        assert_relative_eq!(c.length(), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(c.end().x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.end().y, 1.0, epsilon = 1e-12);
        let mid = c.midpoint();
        assert_relative_eq!(mid.x, (PI / 4.0).cos(), epsilon = 1e-12);

        let cw = Curve2d::arc(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), false);
        assert_relative_eq!(cw.length(), 3.0 * FRAC_PI_2, epsilon = 1e-12);
        assert!(cw.curvature() < 0.0);
    }

    #[test]
    fn arc_param_outside_sweep() {
        let c = Curve2d::arc(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), true);
        assert!(c.param_at(&p(0.0, -1.0)) < 0.0);
        assert!(c.param_at(&p(-1.0, 0.0)) > 1.0);
        assert_relative_eq!(c.distance_to(&p(0.0, -1.0)), 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn half_disc_signed_area() {
        let upper = Curve2d::arc(p(0.0, 0.0), p(1.0, 0.0), p(-1.0, 0.0), true);
        let base = Curve2d::line(p(-1.0, 0.0), p(1.0, 0.0));
        let area = upper.signed_area_term() + base.signed_area_term();
        assert_relative_eq!(area, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn crossing_lines_intersect_once() {
        let a = Curve2d::line(p(0.0, 0.0), p(4.0, 4.0));
        let b = Curve2d::line(p(0.0, 4.0), p(4.0, 0.0));
        let pts = intersections(&a, &b, TOL);
        assert_eq!(pts.len(), 1);
        assert_relative_eq!(pts[0].x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn collinear_overlap_reports_overlap_ends() {
        let a = Curve2d::line(p(0.0, 0.0), p(4.0, 0.0));
        let b = Curve2d::line(p(2.0, 0.0), p(6.0, 0.0));
        let mut xs: Vec<f64> = intersections(&a, &b, TOL).iter().map(|q| q.x).collect();
        xs.sort_by(f64::total_cmp);
        assert_eq!(xs, vec![2.0, 4.0]);
    }

    #[test]
    fn t_junction_is_found() {
        let a = Curve2d::line(p(0.0, 0.0), p(4.0, 0.0));
        let b = Curve2d::line(p(2.0, 0.0), p(2.0, 3.0));
        let pts = intersections(&a, &b, TOL);
        assert_eq!(pts.len(), 1);
        assert_relative_eq!(pts[0].x, 2.0);
    }

    #[test]
    fn line_crosses_arc() {
        let arc = Curve2d::arc(p(0.0, 0.0), p(2.0, 0.0), p(-2.0, 0.0), true);
        let line = Curve2d::line(p(0.0, -1.0), p(0.0, 3.0));
        let pts = intersections(&arc, &line, TOL);
        assert_eq!(pts.len(), 1);
        assert_relative_eq!(pts[0].y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn overlap_length_along_carrier() {
        let carrier = Curve2d::line(p(0.0, 0.0), p(10.0, 0.0));
        let piece = Curve2d::line(p(6.0, 0.0), p(2.0, 0.0));
        assert_relative_eq!(piece.overlap_length(&carrier, TOL), 4.0);
        let off = Curve2d::line(p(2.0, 1.0), p(6.0, 1.0));
        assert_eq!(off.overlap_length(&carrier, TOL), 0.0);
    }

    #[test]
    fn mirror_flips_arc_direction() {
        let arc = Curve2d::arc(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), true);
        let mirror = Matrix3::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let out = arc.transformed(&mirror).unwrap();
        assert!(out.curvature() < 0.0);
        assert_relative_eq!(out.length(), FRAC_PI_2, epsilon = 1e-12);

        let stretch = Matrix3::new(2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        assert!(arc.transformed(&stretch).is_none());
    }

    #[test]
    fn circle_is_two_closed_halves() {
        let [a, b] = Curve2d::circle(p(1.0, 1.0), 2.0);
        assert!((a.end() - b.start()).norm() < 1e-12);
        assert!((b.end() - a.start()).norm() < 1e-12);
        let area = a.signed_area_term() + b.signed_area_term();
        assert_relative_eq!(area, 4.0 * PI, epsilon = 1e-9);
    }
}
