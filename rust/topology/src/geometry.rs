// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric queries on sketch entities and tessellated contours.
//!
//! Exact signed areas and containment come from the curves themselves
//! (shoelace chord terms plus circular segments, analytic ray crossings).
//! Overlap areas work on polylines: arcs are tessellated at a fixed segment
//! count per full turn and handed to `i_overlay` in its
//! `Vec<Vec<[f64; 2]>>` path format.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

use crate::arena::Sketch;
use crate::curve::Curve2d;
use crate::keys::*;

/// A closed polyline in `i_overlay` path format (implicitly closed).
pub type Contour = Vec<[f64; 2]>;

/// Signed area of a closed polyline; positive when counter-clockwise.
pub fn contour_area(contour: &[[f64; 2]]) -> f64 {
    let n = contour.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let [x0, y0] = contour[i];
        let [x1, y1] = contour[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    sum * 0.5
}

/// Number of times a ray from `p` towards +x crosses `curve`.
///
/// Lines use the half-open rule on `y` so a ray through a shared vertex is
/// counted once; arcs are intersected analytically with the ray.
pub fn ray_crossings(p: &Point2<f64>, curve: &Curve2d) -> usize {
    match curve {
        Curve2d::Line(l) => {
            if (l.start.y > p.y) == (l.end.y > p.y) {
                return 0;
            }
            let x = l.start.x + (p.y - l.start.y) * (l.end.x - l.start.x) / (l.end.y - l.start.y);
            usize::from(p.x < x)
        }
        Curve2d::Arc(a) => {
            let dy = p.y - a.center.y;
            if dy.abs() >= a.radius {
                return 0;
            }
            let h = (a.radius * a.radius - dy * dy).sqrt();
            [a.center.x - h, a.center.x + h]
                .into_iter()
                .filter(|&x| x > p.x)
                .filter(|&x| (0.0..1.0).contains(&curve.param_at(&Point2::new(x, p.y))))
                .count()
        }
    }
}

/// Even-odd containment of `p` against a set of closed curve loops.
pub fn point_in_curves<'a>(p: &Point2<f64>, curves: impl IntoIterator<Item = &'a Curve2d>) -> bool {
    curves
        .into_iter()
        .map(|c| ray_crossings(p, c))
        .sum::<usize>()
        % 2
        == 1
}

/// Exact signed area enclosed by a closed chain of curves.
pub fn loop_signed_area(curves: &[Curve2d]) -> f64 {
    curves.iter().map(Curve2d::signed_area_term).sum()
}

/// Polyline approximation of a closed chain of curves.
pub fn tessellate_loop(curves: &[Curve2d], arc_segments: usize) -> Contour {
    let mut out = Vec::with_capacity(curves.len());
    for c in curves {
        c.tessellate_into(&mut out, arc_segments);
    }
    out
}

/// Area of a shape set as returned by `i_overlay`: each shape's first
/// contour is its outer boundary, the rest are holes.
pub fn shapes_area(shapes: &[Vec<Contour>]) -> f64 {
    shapes
        .iter()
        .map(|shape| {
            let mut contours = shape.iter();
            let outer = contours.next().map_or(0.0, |c| contour_area(c).abs());
            outer - contours.map(|c| contour_area(c).abs()).sum::<f64>()
        })
        .sum()
}

/// Area common to two regions, each given as even-odd contours.
pub fn intersection_area(subject: &[Contour], clip: &[Contour]) -> f64 {
    if subject.is_empty() || clip.is_empty() {
        return 0.0;
    }
    let subject: Vec<Contour> = subject.to_vec();
    let clip: Vec<Contour> = clip.to_vec();
    let result = subject.overlay(&clip, OverlayRule::Intersect, FillRule::EvenOdd);
    shapes_area(&result).max(0.0)
}

/// Bounding box of a contour set as `(min, max)`.
pub fn contours_bounds(contours: &[Contour]) -> Option<(Point2<f64>, Point2<f64>)> {
    let mut pts = contours.iter().flatten();
    let first = pts.next()?;
    let mut min = Point2::new(first[0], first[1]);
    let mut max = min;
    for p in pts {
        min.x = min.x.min(p[0]);
        min.y = min.y.min(p[1]);
        max.x = max.x.max(p[0]);
        max.y = max.y.max(p[1]);
    }
    Some((min, max))
}

impl<P> Sketch<P> {
    /// Length of an edge curve.
    pub fn edge_length(&self, key: EdgeKey) -> Option<f64> {
        self.edges.get(key).map(|e| e.curve.length())
    }

    /// Exact signed area of a wire; positive for outer wires, negative for
    /// holes.
    pub fn wire_signed_area(&self, key: WireKey) -> Option<f64> {
        Some(loop_signed_area(&self.wire_curves(key)?))
    }

    /// Polyline approximation of a wire.
    pub fn wire_contour(&self, key: WireKey, arc_segments: usize) -> Option<Contour> {
        Some(tessellate_loop(&self.wire_curves(key)?, arc_segments))
    }

    /// Polyline approximation of a face, outer contour first.
    pub fn face_contours(&self, key: FaceKey, arc_segments: usize) -> Option<Vec<Contour>> {
        self.face_wires(key)?
            .into_iter()
            .map(|wk| self.wire_contour(wk, arc_segments))
            .collect()
    }

    /// Exact area of a face: outer wire minus holes.
    pub fn face_area(&self, key: FaceKey) -> Option<f64> {
        let face = self.faces.get(key)?;
        let mut total = self.wire_signed_area(face.outer)?.abs();
        for &wk in &face.holes {
            total -= self.wire_signed_area(wk)?.abs();
        }
        Some(total)
    }

    /// `true` if `p` lies inside the face (inside the outer wire and outside
    /// every hole).
    pub fn face_contains_point(&self, key: FaceKey, p: &Point2<f64>) -> bool {
        let Some(wires) = self.face_wires(key) else {
            return false;
        };
        let curves: Option<Vec<Vec<Curve2d>>> =
            wires.into_iter().map(|wk| self.wire_curves(wk)).collect();
        curves.is_some_and(|loops| point_in_curves(p, loops.iter().flatten()))
    }

    /// Face containing `p`, if any.
    pub fn face_at(&self, p: &Point2<f64>) -> Option<FaceKey> {
        self.faces.keys().find(|&fk| self.face_contains_point(fk, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x0: f64, y0: f64, size: f64) -> Contour {
        vec![
            [x0, y0],
            [x0 + size, y0],
            [x0 + size, y0 + size],
            [x0, y0 + size],
        ]
    }

    #[test]
    fn contour_area_sign_follows_winding() {
        let ccw = square(0.0, 0.0, 2.0);
        assert_relative_eq!(contour_area(&ccw), 4.0);
        let cw: Contour = ccw.iter().rev().copied().collect();
        assert_relative_eq!(contour_area(&cw), -4.0);
    }

    fn square_loop(x0: f64, y0: f64, size: f64) -> Vec<Curve2d> {
        let c = square(x0, y0, size);
        (0..4)
            .map(|i| {
                let [ax, ay] = c[i];
                let [bx, by] = c[(i + 1) % 4];
                Curve2d::line(Point2::new(ax, ay), Point2::new(bx, by))
            })
            .collect()
    }

    #[test]
    fn even_odd_respects_holes() {
        let mut loops = square_loop(0.0, 0.0, 10.0);
        loops.extend(square_loop(4.0, 4.0, 2.0));
        assert!(point_in_curves(&Point2::new(1.0, 1.0), &loops));
        assert!(!point_in_curves(&Point2::new(5.0, 5.0), &loops));
        assert!(!point_in_curves(&Point2::new(11.0, 5.0), &loops));
        // Ray passing exactly through a corner
        assert!(point_in_curves(&Point2::new(1.0, 4.0), &loops));
    }

    #[test]
    fn arc_loops_contain_exactly() {
        let disc = Curve2d::circle(Point2::new(0.0, 0.0), 1.0);
        assert!(point_in_curves(&Point2::new(0.0, 0.0), &disc));
        assert!(point_in_curves(&Point2::new(-0.9999, 0.001), &disc));
        assert!(!point_in_curves(&Point2::new(-1.0001, 0.001), &disc));
        assert!(!point_in_curves(&Point2::new(0.0, 1.5), &disc));
    }

    #[test]
    fn overlap_of_offset_squares() {
        let a = vec![square(0.0, 0.0, 4.0)];
        let b = vec![square(2.0, 2.0, 4.0)];
        assert_relative_eq!(intersection_area(&a, &b), 4.0, epsilon = 1e-9);

        let far = vec![square(10.0, 10.0, 1.0)];
        assert_relative_eq!(intersection_area(&a, &far), 0.0);
    }

    #[test]
    fn overlap_subtracts_holes() {
        let framed = vec![square(0.0, 0.0, 10.0), square(2.0, 2.0, 6.0)];
        let full = vec![square(0.0, 0.0, 10.0)];
        assert_relative_eq!(intersection_area(&framed, &full), 64.0, epsilon = 1e-9);
    }

    #[test]
    fn tessellated_circle_area_converges() {
        let circle = Curve2d::circle(Point2::new(0.0, 0.0), 1.0);
        let exact = loop_signed_area(&circle);
        let poly = contour_area(&tessellate_loop(&circle, 128));
        assert_relative_eq!(exact, std::f64::consts::PI, epsilon = 1e-9);
        assert!((exact - poly).abs() < 2e-3);
    }
}
