// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Affine transformations of a whole sketch.
//!
//! Transforms move points, edge curves, guide lines and the stored
//! background in place; no rebuild runs and every key stays valid. A
//! transform with a negative determinant mirrors the plane, so every wire
//! is reversed afterwards to keep outer wires counter-clockwise and holes
//! clockwise.

use nalgebra::{Matrix3, Point2, Rotation2, Vector2, Vector3};

use crate::arena::Sketch;
use crate::curve::Curve2d;
use crate::error::{Error, Result};
use crate::keys::*;
use crate::region::{BuilderCurve, BuilderRegion};

const SINGULAR_EPS: f64 = 1e-12;

fn apply(m: &Matrix3<f64>, p: &Point2<f64>) -> Point2<f64> {
    let v = m * Vector3::new(p.x, p.y, 1.0);
    Point2::new(v.x, v.y)
}

fn transform_curve(curve: &Curve2d, m: &Matrix3<f64>) -> Result<Curve2d> {
    curve.transformed(m).ok_or_else(|| {
        Error::UnsupportedTransform("arcs only admit similarity transforms".into())
    })
}

fn transform_region(region: &BuilderRegion, m: &Matrix3<f64>) -> Result<BuilderRegion> {
    let curves = |lp: &[BuilderCurve]| -> Result<Vec<BuilderCurve>> {
        lp.iter()
            .map(|c| Ok(BuilderCurve::new(transform_curve(&c.curve, m)?, c.topology_id.clone())))
            .collect()
    };
    Ok(BuilderRegion {
        outer: curves(&region.outer)?,
        holes: region.holes.iter().map(|h| curves(h)).collect::<Result<_>>()?,
        topology_id: region.topology_id.clone(),
    })
}

impl<P> Sketch<P> {
    /// Applies a 2D homogeneous transform to the whole sketch.
    ///
    /// Fails without touching anything when the transform is singular, or
    /// when it is not a similarity and the sketch holds arcs.
    pub fn transform(&mut self, matrix: &Matrix3<f64>) -> Result<()> {
        let det = matrix[(0, 0)] * matrix[(1, 1)] - matrix[(0, 1)] * matrix[(1, 0)];
        if !det.is_finite() || det.abs() < SINGULAR_EPS {
            return Err(Error::UnsupportedTransform(format!("singular transform (det {det})")));
        }

        let edges: Vec<(EdgeKey, Curve2d)> = self
            .edges
            .iter()
            .map(|(k, e)| Ok((k, transform_curve(&e.curve, matrix)?)))
            .collect::<Result<_>>()?;
        let guides: Vec<(GuideLineKey, Curve2d)> = self
            .guide_lines
            .iter()
            .map(|(k, g)| Ok((k, transform_curve(&g.curve, matrix)?)))
            .collect::<Result<_>>()?;
        let background = self
            .background
            .as_ref()
            .map(|b| transform_region(b, matrix))
            .transpose()?;

        for point in self.points.values_mut() {
            point.position = apply(matrix, &point.position);
        }
        for (k, curve) in edges {
            let (start, end) = (self.edges[k].start, self.edges[k].end);
            self.edges[k].curve =
                curve.with_endpoints(self.points[start].position, self.points[end].position);
        }
        for (k, curve) in guides {
            self.guide_lines[k].curve = curve;
        }
        self.background = background;

        if det < 0.0 {
            self.reverse_wires();
        }
        Ok(())
    }

    /// Moves the sketch by `offset`.
    pub fn translate(&mut self, offset: &Vector2<f64>) -> Result<()> {
        self.transform(&Matrix3::new_translation(offset))
    }

    /// Rotates the sketch by `angle` radians around `center`.
    pub fn rotate(&mut self, center: &Point2<f64>, angle: f64) -> Result<()> {
        let rotation = Rotation2::new(angle).to_homogeneous();
        let m = Matrix3::new_translation(&center.coords)
            * rotation
            * Matrix3::new_translation(&-center.coords);
        self.transform(&m)
    }

    /// Scales the sketch uniformly about `origin`.
    pub fn scale(&mut self, origin: &Point2<f64>, factor: f64) -> Result<()> {
        let m = Matrix3::new_translation(&origin.coords)
            * Matrix3::new_scaling(factor)
            * Matrix3::new_translation(&-origin.coords);
        self.transform(&m)
    }

    /// Mirrors the sketch across the line through `point` along `direction`.
    pub fn mirror(&mut self, point: &Point2<f64>, direction: &Vector2<f64>) -> Result<()> {
        let n = direction.norm();
        if n < SINGULAR_EPS {
            return Err(Error::UnsupportedTransform("mirror axis has no direction".into()));
        }
        let d = direction / n;
        let mut m = Matrix3::identity();
        m[(0, 0)] = 2.0 * d.x * d.x - 1.0;
        m[(0, 1)] = 2.0 * d.x * d.y;
        m[(1, 0)] = 2.0 * d.x * d.y;
        m[(1, 1)] = 2.0 * d.y * d.y - 1.0;
        let m = Matrix3::new_translation(&point.coords)
            * m
            * Matrix3::new_translation(&-point.coords);
        self.transform(&m)
    }

    /// Flips the direction of every wire.
    fn reverse_wires(&mut self) {
        for coedge in self.coedges.values_mut() {
            coedge.reversed = !coedge.reversed;
            std::mem::swap(&mut coedge.next, &mut coedge.prev);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    fn room() -> Sketch {
        let mut sketch = Sketch::new();
        sketch
            .create_builder()
            .add_regions(vec![BuilderRegion::polygon(
                "A",
                &[p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(0.0, 3.0)],
            )])
            .unwrap();
        sketch
    }

    #[test]
    fn translate_moves_points_and_curves() {
        let mut sketch = room();
        sketch.translate(&Vector2::new(10.0, -1.0)).unwrap();
        let fk = sketch.face_by_name("A").unwrap();
        assert_relative_eq!(sketch.face_area(fk).unwrap(), 12.0, epsilon = 1e-9);
        assert!(sketch.face_contains_point(fk, &p(12.0, 0.5)));
        for (_, edge) in sketch.edges() {
            let start = sketch.point(edge.start).unwrap().position;
            assert_eq!(edge.curve.start(), start);
        }
        assert!(sketch.validate(1e-6).is_ok());
    }

    #[test]
    fn rotation_keeps_area() {
        let mut sketch = room();
        sketch.rotate(&p(0.0, 0.0), FRAC_PI_2).unwrap();
        let fk = sketch.face_by_name("A").unwrap();
        assert_relative_eq!(sketch.face_area(fk).unwrap(), 12.0, epsilon = 1e-9);
        assert!(sketch.face_contains_point(fk, &p(-1.0, 1.0)));
    }

    #[test]
    fn mirror_keeps_outer_wire_counter_clockwise() {
        let mut sketch = room();
        sketch.mirror(&p(0.0, 0.0), &Vector2::new(0.0, 1.0)).unwrap();
        let fk = sketch.face_by_name("A").unwrap();
        let outer = sketch.face(fk).unwrap().outer;
        assert!(sketch.wire_signed_area(outer).unwrap() > 0.0);
        assert!(sketch.face_contains_point(fk, &p(-2.0, 1.0)));
        assert!(sketch.validate(1e-6).is_ok());
    }

    #[test]
    fn arcs_reject_non_uniform_scale() {
        let mut sketch: Sketch = Sketch::new();
        sketch
            .create_builder()
            .add_circle_path(p(0.0, 0.0), 1.0, "disc")
            .unwrap();
        let before = sketch.get_all_points();

        let stretch = Matrix3::new_nonuniform_scaling(&Vector2::new(2.0, 1.0));
        assert!(matches!(
            sketch.transform(&stretch),
            Err(Error::UnsupportedTransform(_))
        ));
        assert_eq!(sketch.get_all_points(), before);

        sketch.scale(&p(0.0, 0.0), 2.0).unwrap();
        let fk = sketch.face_by_name("disc").unwrap();
        assert_relative_eq!(sketch.face_area(fk).unwrap(), 4.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let mut sketch = room();
        let flat = Matrix3::new_nonuniform_scaling(&Vector2::new(1.0, 0.0));
        assert!(matches!(
            sketch.transform(&flat),
            Err(Error::UnsupportedTransform(_))
        ));
    }
}
